//! Event trigger management
//!
//! - `POST   /api/events/`       create
//! - `GET    /api/events/filter` list with filters, newest first
//! - `PUT    /api/events/{id}`   update
//! - `DELETE /api/events/{id}`   soft delete

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
use crate::store::{EventFilter, EventInput};
use crate::types::{AssuranceError, Result};

pub async fn handle_event_request<B>(
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
    let id = path_param(path, "/api/events/", "");

    let result = match (method, path, id) {
        (Method::POST, "/api/events/", _) | (Method::POST, "/api/events", _) => {
            create(req, &state, &principal).await
        }
        (Method::GET, "/api/events/filter", _) => {
            filter(query.as_deref(), &state, &principal).await
        }
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
    let input: EventInput = read_json(req).await?;
    input.validate().map_err(AssuranceError::BadRequest)?;

    let event = state
        .management
        .create_event(input, &principal.company_id, principal.actor())
        .await?;
    info!(event_id = %event.id, "Event created");

    Ok(success("Event created", event))
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
    let input: EventInput = read_json(req).await?;
    input.validate().map_err(AssuranceError::BadRequest)?;

    let event = state
        .management
        .update_event(id, input, principal.company_scope(), principal.actor())
        .await?
        .ok_or_else(|| AssuranceError::NotFound("Event not found".into()))?;

    Ok(success("Event updated", event))
}

async fn delete(id: &str, state: &AppState, principal: &Principal) -> Result<Response<FullBody>> {
    let deleted = state
        .management
        .delete_event(id, principal.company_scope(), principal.actor())
        .await?;
    if !deleted {
        return Err(AssuranceError::NotFound("Event not found".into()));
    }
    info!(event_id = id, by = principal.actor(), "Event deleted");

    Ok(success_empty("Event deleted"))
}

async fn filter(
    query: Option<&str>,
    state: &AppState,
    principal: &Principal,
) -> Result<Response<FullBody>> {
    let filter: EventFilter = parse_query(query)?;
    let events = state
        .management
        .filter_events(&filter, principal.company_scope())
        .await?;

    Ok(success("Filtered events", events))
}
