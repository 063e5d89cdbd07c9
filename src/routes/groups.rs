//! Group chaining assignment
//!
//! - `POST /api/groups/{groupId}/chainings/bulk` replace the group's chainings
//! - `GET  /api/groups/{id}/chainings` company chainings plus assigned ids

use bytes::Bytes;
use hyper::body::Body;
use hyper::{Method, Request, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::Principal;
use crate::routes::response::{not_found_response, path_param, read_json, success, FullBody};
use crate::server::AppState;
use crate::store::ChainingDefinition;
use crate::types::{AssuranceError, Result};

#[derive(Debug, Deserialize)]
pub struct BulkAssignRequest {
    #[serde(default)]
    pub chaining_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupChainingsResponse {
    pub all_chainings: Vec<ChainingDefinition>,
    pub assigned_chaining_ids: Vec<String>,
}

pub async fn handle_group_request<B>(
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

    let result = match method {
        Method::POST => match path_param(path, "/api/groups/", "/chainings/bulk") {
            Some(group_id) => assign(req, &group_id, &state, &principal).await,
            None => return not_found_response(path),
        },
        Method::GET => match path_param(path, "/api/groups/", "/chainings") {
            Some(group_id) => list(&group_id, &state, &principal).await,
            None => return not_found_response(path),
        },
        _ => return not_found_response(path),
    };

    result.unwrap_or_else(Into::into)
}

async fn assign<B>(
    req: Request<B>,
    group_id: &str,
    state: &AppState,
    principal: &Principal,
) -> Result<Response<FullBody>>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let body: BulkAssignRequest = read_json(req).await?;

    let assigned = state
        .management
        .assign_group_chainings(group_id, &body.chaining_ids, principal.company_scope())
        .await?
        .ok_or_else(|| AssuranceError::NotFound("Group not found".into()))?;
    info!(
        group_id,
        requested = body.chaining_ids.len(),
        assigned = assigned.chaining_ids.len(),
        "Group chainings replaced"
    );

    Ok(success("Group chainings updated successfully", assigned))
}

async fn list(group_id: &str, state: &AppState, principal: &Principal) -> Result<Response<FullBody>> {
    let group = state
        .management
        .group_chainings(group_id, principal.company_scope())
        .await?
        .ok_or_else(|| AssuranceError::NotFound("Group not found".into()))?;

    let all_chainings = state
        .management
        .list_company_chainings(&group.company_id)
        .await?;

    Ok(success(
        "Group chainings fetched",
        GroupChainingsResponse {
            all_chainings,
            assigned_chaining_ids: group.chaining_ids,
        },
    ))
}
