//! HTTP surface tests driving `handle_request` with in-memory state

use std::net::SocketAddr;
use std::sync::Arc;

use assurance::auth::TokenInput;
use assurance::server::handle_request;
use assurance::store::{ChainingDefinition, ChainingStore, InMemoryStore, ItemKind};
use assurance::{AppState, AssuranceError, Args};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use clap::Parser;
use http_body_util::{BodyExt, Full};
use hyper::header::HeaderValue;
use hyper::{Method, Request, StatusCode};
use serde_json::{json, Value};

const API_KEY: &str = "test-api-key";

struct Harness {
    state: Arc<AppState>,
    store: InMemoryStore,
    group: String,
}

/// Read path whose chaining listing always fails
struct OfflineChainings;

#[async_trait::async_trait]
impl ChainingStore for OfflineChainings {
    async fn list_active_chainings_for_device(
        &self,
        _device_external_id: &str,
    ) -> assurance::Result<Vec<ChainingDefinition>> {
        Err(AssuranceError::Database("Cursor read failed: connection reset".into()))
    }

    async fn find_completion(
        &self,
        _kind: ItemKind,
        _item_id: &str,
        _chaining_id: &str,
        _user_id: &str,
        _utc_start: DateTime<Utc>,
        _utc_end: DateTime<Utc>,
    ) -> assurance::Result<Option<DateTime<Utc>>> {
        Ok(None)
    }

    async fn item_display_name(&self, _kind: ItemKind, _item_id: &str) -> assurance::Result<String> {
        Ok(String::new())
    }
}

fn test_args() -> Args {
    Args::try_parse_from(["assurance", "--dev-mode", "--api-key", API_KEY]).unwrap()
}

impl Harness {
    async fn new() -> Self {
        let store = InMemoryStore::new();
        let device = store.add_device("TAB-01").await;
        let group = store.add_group("acme", &[device]).await;
        let state = AppState::new(test_args(), Arc::new(store.clone()), "memory").unwrap();
        Self {
            state: Arc::new(state),
            store,
            group,
        }
    }

    /// Harness whose outstanding-work read path is unavailable
    async fn with_offline_chainings() -> Self {
        let store = InMemoryStore::new();
        let device = store.add_device("TAB-01").await;
        let group = store.add_group("acme", &[device]).await;
        let state = AppState::with_stores(
            test_args(),
            Arc::new(OfflineChainings),
            Arc::new(store.clone()),
            "memory",
        )
        .unwrap();
        Self {
            state: Arc::new(state),
            store,
            group,
        }
    }

    fn token(&self, username: &str, role: &str, company: &str) -> String {
        self.state
            .jwt
            .generate_token(TokenInput {
                user_id: format!("uid-{username}"),
                username: username.into(),
                email: format!("{username}@example.com"),
                role: role.into(),
                company_id: company.into(),
            })
            .unwrap()
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("X-API-KEY", API_KEY);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let body = body.map(|b| b.to_string()).unwrap_or_default();
        let req = builder.body(Full::new(Bytes::from(body))).unwrap();

        let addr: SocketAddr = "127.0.0.1:9".parse().unwrap();
        let resp = handle_request(self.state.clone(), addr, req).await;
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Create a daily chaining over one catalog inspection and assign it to the group
    async fn scheduled_chaining(&self, token: &str) -> (String, String) {
        let item_id = self
            .store
            .add_catalog_item(ItemKind::Inspection, "Fire extinguisher check")
            .await;
        let (status, body) = self
            .send(
                Method::POST,
                "/api/chainings/",
                Some(token),
                &[],
                Some(json!({
                    "name_chaining": "Morning round",
                    "trigger_datetime": "2024-01-01T00:00:00Z",
                    "frequency_value": 1,
                    "frequency_unit": "day",
                    "details": [
                        {"item_type": "inspection", "item_id": item_id, "sequence": 1}
                    ]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let chaining_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = self
            .send(
                Method::POST,
                &format!("/api/groups/{}/chainings/bulk", self.group),
                Some(token),
                &[],
                Some(json!({ "chaining_ids": [chaining_id] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["message"], "Group chainings updated successfully");

        (chaining_id, item_id)
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let h = Harness::new().await;
    let req = Request::builder()
        .uri("/health")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let resp = handle_request(h.state.clone(), "127.0.0.1:9".parse().unwrap(), req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_requires_key_and_token() {
    let h = Harness::new().await;
    let token = h.token("alice", "admin", "acme");

    let req = Request::builder()
        .uri("/api/chainings/filter")
        .header("X-API-KEY", "wrong")
        .header("Authorization", format!("Bearer {token}"))
        .body(Full::new(Bytes::new()))
        .unwrap();
    let resp = handle_request(h.state.clone(), "127.0.0.1:9".parse().unwrap(), req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let (status, body) = h
        .send(Method::GET, "/api/chainings/filter", None, &[], None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");

    let refresh = h.state.jwt.generate_refresh_token("uid-alice").unwrap();
    let (status, _) = h
        .send(Method::GET, "/api/chainings/filter", Some(&refresh), &[], None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_device_sees_outstanding_until_completed() {
    let h = Harness::new().await;
    let token = h.token("alice", "admin", "acme");
    let (chaining_id, item_id) = h.scheduled_chaining(&token).await;

    let (status, body) = h
        .send(
            Method::GET,
            "/api/devices/TAB-01/chainingnew",
            Some(&token),
            &[("X-Timezone", "Asia/Jakarta")],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Active chaining fetched successfully");
    let chaining = &body["data"][0];
    assert_eq!(chaining["id"], chaining_id.as_str());
    assert_eq!(chaining["timezone"], "Asia/Jakarta");
    assert!(chaining["trigger_time_local"].as_str().unwrap().ends_with("+07:00"));
    assert_eq!(chaining["event_trigger_active"], true);
    assert_eq!(chaining["active_items"][0]["item_name"], "Fire extinguisher check");

    h.store
        .record_completion(ItemKind::Inspection, &item_id, &chaining_id, "alice", chrono::Utc::now())
        .await;

    let (status, body) = h
        .send(Method::GET, "/api/devices/TAB-01/chainingnew", Some(&token), &[], None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "No active chaining for this user");
}

#[tokio::test]
async fn test_invalid_timezone_falls_back_and_is_counted() {
    let h = Harness::new().await;
    let token = h.token("alice", "admin", "acme");
    h.scheduled_chaining(&token).await;

    let (status, body) = h
        .send(
            Method::GET,
            "/api/devices/TAB-01/chainingnew",
            Some(&token),
            &[("X-Timezone", "Mars/Olympus")],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["timezone"], "UTC");

    let (_, status_body) = h.send(Method::GET, "/status", None, &[], None).await;
    assert_eq!(status_body["fallbacks"]["timezone"], 1);
    assert_eq!(status_body["api_key_required"], true);
}

#[tokio::test]
async fn test_chaining_crud_is_company_scoped() {
    let h = Harness::new().await;
    let admin = h.token("alice", "admin", "acme");
    let outsider = h.token("mallory", "admin", "globex");
    let root = h.token("root", "super-admin", "");
    let (chaining_id, _) = h.scheduled_chaining(&admin).await;
    let path = format!("/api/chainings/{chaining_id}");

    let (status, body) = h.send(Method::GET, &path, Some(&admin), &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["details"][0]["item_name"], "Fire extinguisher check");

    let (status, body) = h.send(Method::GET, &path, Some(&outsider), &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Chaining not found");

    let (status, _) = h.send(Method::GET, &path, Some(&root), &[], None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = h
        .send(
            Method::PUT,
            &path,
            Some(&admin),
            &[],
            Some(json!({
                "name_chaining": "Evening round",
                "trigger_datetime": "2024-01-01T12:00:00Z",
                "frequency_value": 1,
                "frequency_unit": "day"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name_chaining"], "Evening round");
    assert_eq!(body["data"]["details"].as_array().unwrap().len(), 0);

    let (status, body) = h
        .send(Method::GET, "/api/chainings/filter?name_chaining=evening", Some(&admin), &[], None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = h.send(Method::DELETE, &path, Some(&outsider), &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = h.send(Method::DELETE, &path, Some(&admin), &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Chaining deleted");
    let (status, _) = h.send(Method::GET, &path, Some(&admin), &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_rejects_blank_name() {
    let h = Harness::new().await;
    let token = h.token("alice", "admin", "acme");

    let (status, body) = h
        .send(
            Method::POST,
            "/api/chainings",
            Some(&token),
            &[],
            Some(json!({ "name_chaining": "  " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_event_link_controls_trigger_flag() {
    let h = Harness::new().await;
    let token = h.token("alice", "admin", "acme");
    let (chaining_id, item_id) = h.scheduled_chaining(&token).await;

    let (status, body) = h
        .send(
            Method::POST,
            "/api/events",
            Some(&token),
            &[],
            Some(json!({ "event_name": "Shift start", "trigger": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let event_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = h
        .send(
            Method::PUT,
            &format!("/api/chainings/{chaining_id}"),
            Some(&token),
            &[],
            Some(json!({
                "name_chaining": "Morning round",
                "trigger_datetime": "2024-01-01T00:00:00Z",
                "frequency_value": 1,
                "frequency_unit": "day",
                "event_trigger_id": event_id,
                "details": [
                    {"item_type": "inspection", "item_id": item_id, "sequence": 1}
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = h
        .send(Method::GET, "/api/devices/TAB-01/chainingnew", Some(&token), &[], None)
        .await;
    assert_eq!(body["data"][0]["event_name"], "Shift start");
    assert_eq!(body["data"][0]["event_trigger_active"], false);

    let (status, _) = h
        .send(
            Method::PUT,
            &format!("/api/events/{event_id}"),
            Some(&token),
            &[],
            Some(json!({ "event_name": "Shift start", "trigger": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = h
        .send(Method::GET, "/api/devices/TAB-01/chainingnew", Some(&token), &[], None)
        .await;
    assert_eq!(body["data"][0]["event_trigger_active"], true);
}

#[tokio::test]
async fn test_group_listing_and_foreign_assignment() {
    let h = Harness::new().await;
    let token = h.token("alice", "admin", "acme");
    let (chaining_id, _) = h.scheduled_chaining(&token).await;

    let root = h.token("root", "super-admin", "");
    let (status, body) = h
        .send(
            Method::POST,
            "/api/chainings",
            Some(&root),
            &[],
            Some(json!({ "name_chaining": "Root-owned round" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let foreign_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = h
        .send(
            Method::POST,
            &format!("/api/groups/{}/chainings/bulk", h.group),
            Some(&token),
            &[],
            Some(json!({ "chaining_ids": [chaining_id, foreign_id] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["chaining_ids"], json!([chaining_id]));

    let (status, body) = h
        .send(
            Method::GET,
            &format!("/api/groups/{}/chainings", h.group),
            Some(&token),
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["assigned_chaining_ids"], json!([chaining_id]));
    assert_eq!(body["data"]["all_chainings"].as_array().unwrap().len(), 1);

    let outsider = h.token("mallory", "admin", "globex");
    let (status, body) = h
        .send(
            Method::GET,
            &format!("/api/groups/{}/chainings", h.group),
            Some(&outsider),
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Group not found");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let h = Harness::new().await;
    let (status, body) = h.send(Method::GET, "/nowhere", None, &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_store_failure_is_server_error() {
    let h = Harness::with_offline_chainings().await;
    let token = h.token("alice", "admin", "acme");

    let (status, body) = h
        .send(Method::GET, "/api/devices/TAB-01/chainingnew", Some(&token), &[], None)
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert_ne!(body["message"], "No active chaining for this user");
}

#[tokio::test]
async fn test_non_utf8_timezone_counts_as_fallback() {
    let h = Harness::new().await;
    let token = h.token("alice", "admin", "acme");
    h.scheduled_chaining(&token).await;

    let req = Request::builder()
        .uri("/api/devices/TAB-01/chainingnew")
        .header("X-API-KEY", API_KEY)
        .header("Authorization", format!("Bearer {token}"))
        .header("X-Timezone", HeaderValue::from_bytes(b"Asia/\xffJakarta").unwrap())
        .body(Full::new(Bytes::new()))
        .unwrap();
    let resp = handle_request(h.state.clone(), "127.0.0.1:9".parse().unwrap(), req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"][0]["timezone"], "UTC");

    let (_, status_body) = h.send(Method::GET, "/status", None, &[], None).await;
    assert_eq!(status_body["fallbacks"]["timezone"], 1);
}
