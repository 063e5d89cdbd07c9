//! Chaining definition management
//!
//! - `POST   /api/chainings/`       create
//! - `GET    /api/chainings/filter` list with filters, newest first
//! - `GET    /api/chainings/{id}`   fetch with item names
//! - `PUT    /api/chainings/{id}`   update and reconcile items
//! - `DELETE /api/chainings/{id}`   soft delete

use bytes::Bytes;
use hyper::body::Body;
use hyper::{Method, Request, Response};
use std::sync::Arc;
use tracing::info;

use crate::auth::Principal;
use crate::routes::response::{
    not_found_response, parse_query, path_param, read_json, success, success_empty, FullBody,
};
use crate::server::AppState;
use crate::store::{ChainingFilter, ChainingInput};
use crate::types::{AssuranceError, Result};

const PREFIX: &str = "/api/chainings/";

pub async fn handle_chaining_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    path: &str,
    principal: Principal,
) -> Response<FullBody>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let query = req.uri().query().map(str::to_string);
    let id = path_param(path, PREFIX, "");

    let result = match (method, path, id) {
        (Method::POST, "/api/chainings/", _) | (Method::POST, "/api/chainings", _) => {
            create(req, &state, &principal).await
        }
        (Method::GET, "/api/chainings/filter", _) => {
            filter(query.as_deref(), &state, &principal).await
        }
        (Method::GET, _, Some(id)) => get(&id, &state, &principal).await,
        (Method::PUT, _, Some(id)) => update(req, &id, &state, &principal).await,
        (Method::DELETE, _, Some(id)) => delete(&id, &state, &principal).await,
        _ => return not_found_response(path),
    };

    result.unwrap_or_else(Into::into)
}

async fn create<B>(req: Request<B>, state: &AppState, principal: &Principal) -> Result<Response<FullBody>>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let input: ChainingInput = read_json(req).await?;
    input.validate().map_err(AssuranceError::BadRequest)?;

    let chaining = state
        .management
        .create_chaining(input, &principal.company_id, principal.actor())
        .await?;
    info!(chaining_id = %chaining.id, company = %chaining.company_id, "Chaining created");

    Ok(success("Chaining created", chaining))
}

async fn get(id: &str, state: &AppState, principal: &Principal) -> Result<Response<FullBody>> {
    let chaining = state
        .management
        .get_chaining(id, principal.company_scope())
        .await?
        .ok_or_else(|| AssuranceError::NotFound("Chaining not found".into()))?;

    Ok(success("Chaining found", chaining))
}

async fn update<B>(
    req: Request<B>,
    id: &str,
    state: &AppState,
    principal: &Principal,
) -> Result<Response<FullBody>>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let input: ChainingInput = read_json(req).await?;
    input.validate().map_err(AssuranceError::BadRequest)?;

    let chaining = state
        .management
        .update_chaining(id, input, principal.company_scope(), principal.actor())
        .await?
        .ok_or_else(|| AssuranceError::NotFound("Chaining not found".into()))?;
    info!(chaining_id = %chaining.id, "Chaining updated");

    Ok(success("Chaining updated successfully", chaining))
}

async fn delete(id: &str, state: &AppState, principal: &Principal) -> Result<Response<FullBody>> {
    let deleted = state
        .management
        .delete_chaining(id, principal.company_scope(), principal.actor())
        .await?;
    if !deleted {
        return Err(AssuranceError::NotFound("Chaining not found".into()));
    }
    info!(chaining_id = id, by = principal.actor(), "Chaining deleted");

    Ok(success_empty("Chaining deleted"))
}

async fn filter(
    query: Option<&str>,
    state: &AppState,
    principal: &Principal,
) -> Result<Response<FullBody>> {
    let filter: ChainingFilter = parse_query(query)?;
    let chainings = state
        .management
        .filter_chainings(&filter, principal.company_scope())
        .await?;

    Ok(success("Filtered chainings", chainings))
}
