//! Request authentication for `/api/*`
//!
//! The shared API key is checked first, then the bearer token. Only access
//! tokens are accepted.

use hyper::header::AUTHORIZATION;
use hyper::Request;

use crate::auth::{extract_token_from_header, Principal, API_KEY_HEADER};
use crate::server::AppState;
use crate::types::AssuranceError;

fn header<'a, B>(req: &'a Request<B>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Authenticate the caller of an API route
pub fn authorize<B>(req: &Request<B>, state: &AppState) -> Result<Principal, AssuranceError> {
    if !state.api_keys.validate(header(req, API_KEY_HEADER)) {
        return Err(AssuranceError::Unauthorized("Unauthorized".into()));
    }

    let token = extract_token_from_header(header(req, AUTHORIZATION.as_str())).ok_or_else(|| {
        AssuranceError::Unauthorized("Missing or invalid Authorization header".into())
    })?;

    let claims = state.jwt.verify_access_token(token)?;
    Ok(claims.into())
}
