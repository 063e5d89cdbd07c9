//! Response envelope and request helpers shared by the route handlers
//!
//! Every API response uses `{"status", "message", "data"}` with status
//! "success" or "error".

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::AssuranceError;

pub type FullBody = Full<Bytes>;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: &'static str,
    pub message: String,
    pub data: Option<T>,
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Failed to build response"))))
}

/// 200 with data
pub fn success<T: Serialize>(message: &str, data: T) -> Response<FullBody> {
    json_response(
        StatusCode::OK,
        &Envelope {
            status: "success",
            message: message.to_string(),
            data: Some(data),
        },
    )
}

/// 200 with `data: null`
pub fn success_empty(message: &str) -> Response<FullBody> {
    json_response(
        StatusCode::OK,
        &Envelope::<()> {
            status: "success",
            message: message.to_string(),
            data: None,
        },
    )
}

pub fn error_response(status: StatusCode, message: &str) -> Response<FullBody> {
    json_response(
        status,
        &Envelope::<()> {
            status: "error",
            message: message.to_string(),
            data: None,
        },
    )
}

impl From<AssuranceError> for Response<FullBody> {
    fn from(err: AssuranceError) -> Self {
        error_response(err.status_code(), err.message())
    }
}

pub fn not_found_response(path: &str) -> Response<FullBody> {
    error_response(StatusCode::NOT_FOUND, &format!("No route for {}", path))
}

/// CORS preflight response
pub fn preflight_response() -> Response<FullBody> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

/// Read and decode a JSON request body
pub async fn read_json<T, B>(req: Request<B>) -> Result<T, AssuranceError>
where
    T: DeserializeOwned,
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| AssuranceError::BadRequest(format!("Invalid body: {}", e)))?
        .to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

/// Decode the query string into a filter struct
pub fn parse_query<T: DeserializeOwned + Default>(query: Option<&str>) -> Result<T, AssuranceError> {
    match query {
        Some(q) if !q.is_empty() => serde_urlencoded::from_str(q)
            .map_err(|e| AssuranceError::BadRequest(format!("Invalid query: {}", e))),
        _ => Ok(T::default()),
    }
}

/// Single path segment between `prefix` and `suffix`, percent-decoded
pub fn path_param(path: &str, prefix: &str, suffix: &str) -> Option<String> {
    let segment = path.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if segment.is_empty() || segment.contains('/') {
        return None;
    }
    urlencoding::decode(segment).ok().map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ChainingFilter;

    #[test]
    fn test_path_param() {
        assert_eq!(
            path_param("/api/devices/TAB-01/chainingnew", "/api/devices/", "/chainingnew"),
            Some("TAB-01".to_string())
        );
        assert_eq!(
            path_param("/api/devices/TAB%2001/chainingnew", "/api/devices/", "/chainingnew"),
            Some("TAB 01".to_string())
        );
        assert_eq!(path_param("/api/devices//chainingnew", "/api/devices/", "/chainingnew"), None);
        assert_eq!(path_param("/api/chainings/a/b", "/api/chainings/", ""), None);
    }

    #[test]
    fn test_parse_query() {
        let filter: ChainingFilter = parse_query(Some("name_chaining=morning&created_by=alice")).unwrap();
        assert_eq!(filter.name_chaining.as_deref(), Some("morning"));
        assert_eq!(filter.created_by.as_deref(), Some("alice"));
        assert!(filter.updated_by.is_none());

        let empty: ChainingFilter = parse_query(None).unwrap();
        assert!(empty.name_chaining.is_none());
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response: Response<FullBody> = AssuranceError::NotFound("Chaining not found".into()).into();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Chaining not found");
        assert!(body["data"].is_null());
    }
}
