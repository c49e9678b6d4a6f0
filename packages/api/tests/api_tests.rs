// ABOUTME: End-to-end tests driving the axum router with oneshot requests
// ABOUTME: Covers identity headers, the response envelope, and the moderation round trip

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use quadbase_api::{create_router, AppState};
use quadbase_attachments::MemoryBlobStore;
use quadbase_catalog::LookupData;
use quadbase_core::constants::{DEFAULT_MAX_UPLOAD_BYTES, LAST_DETAIL_MESSAGE};
use quadbase_storage::test_utils::TestDatabase;
use quadbase_suggestions::APPROVED_DENY_MESSAGE;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    _db: TestDatabase,
    state: AppState,
    router: Router,
}

#[derive(Clone, Copy)]
enum As {
    Anonymous,
    User(&'static str),
    Moderator,
}

async fn test_app() -> TestApp {
    test_app_with_upload_limit(DEFAULT_MAX_UPLOAD_BYTES).await
}

async fn test_app_with_upload_limit(max_upload_bytes: usize) -> TestApp {
    let db = TestDatabase::new().await;
    let state = AppState::new(
        db.pool.clone(),
        Arc::new(MemoryBlobStore::new()),
        max_upload_bytes,
    );
    let router = create_router(state.clone());
    TestApp {
        _db: db,
        state,
        router,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, who: As, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        match who {
            As::Anonymous => {}
            As::User(id) => builder = builder.header("x-user-id", id),
            As::Moderator => {
                builder = builder
                    .header("x-user-id", "mod-1")
                    .header("x-moderator", "true")
            }
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn lookup(&self, data: LookupData) -> String {
        self.state.catalog.create_lookup(&data).await.unwrap().id
    }
}

fn propeller(model: &str, size: u32) -> Value {
    json!({
        "manufacturer": "HQProp",
        "model": model,
        "size": size,
        "pitch": 4.3,
        "blade_count": "3",
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app().await;
    let (status, body) = app.send(Method::GET, "/api/health", As::Anonymous, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "quadbase");
}

#[tokio::test]
async fn test_unknown_kind_is_not_found() {
    let app = test_app().await;
    let (status, body) = app
        .send(Method::GET, "/api/catalog/battery", As::Anonymous, None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "component kind battery not found");
}

#[tokio::test]
async fn test_suggestions_require_identity() {
    let app = test_app().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/suggestions/propeller",
            As::Anonymous,
            Some(propeller("5043", 5)),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_validation_errors_carry_field_messages() {
    let app = test_app().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/suggestions/propeller",
            As::User("user-1"),
            Some(propeller("1x1", 1)),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(
        body["details"]["size"],
        json!(["Ensure this value is greater than or equal to 2."])
    );
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = test_app().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/suggestions/propeller",
            As::User("user-1"),
            Some(json!({ "manufacturer": "HQProp" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_moderation_round_trip() {
    let app = test_app().await;

    let (status, created) = app
        .send(
            Method::POST,
            "/api/suggestions/propeller",
            As::User("user-1"),
            Some(propeller("5043", 5)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["status"], "pending");
    let id = created["data"]["id"].as_str().unwrap().to_string();

    // Other users cannot see it, moderators can
    let (_, others) = app
        .send(Method::GET, "/api/suggestions/propeller", As::User("user-2"), None)
        .await;
    assert_eq!(others["data"]["total_items"], 0);
    let (_, all) = app
        .send(
            Method::GET,
            "/api/suggestions/propeller?status=pending",
            As::Moderator,
            None,
        )
        .await;
    assert_eq!(all["data"]["total_items"], 1);

    let accept_uri = format!("/api/suggestions/propeller/{}/accept", id);
    let (status, _) = app
        .send(Method::POST, &accept_uri, As::User("user-1"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, first) = app.send(Method::POST, &accept_uri, As::Moderator, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["created"], true);
    let component_id = first["data"]["component_id"].as_str().unwrap().to_string();

    let (status, second) = app.send(Method::POST, &accept_uri, As::Moderator, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["created"], false);
    assert_eq!(second["data"]["component_id"], component_id.as_str());

    let (status, component) = app
        .send(
            Method::GET,
            &format!("/api/catalog/propeller/{}", component_id),
            As::Anonymous,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(component["data"]["model"], "5043");
    assert_eq!(component["data"]["owner_id"], Value::Null);

    let (status, denied) = app
        .send(
            Method::POST,
            &format!("/api/suggestions/propeller/{}/deny", id),
            As::Moderator,
            Some(json!({ "admin_comment": "too late" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(denied["error"], APPROVED_DENY_MESSAGE);
}

#[tokio::test]
async fn test_deny_then_resubmit() {
    let app = test_app().await;
    let (_, created) = app
        .send(
            Method::POST,
            "/api/suggestions/propeller",
            As::User("user-1"),
            Some(propeller("3020", 3)),
        )
        .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/suggestions/propeller/{}", id);

    let (status, denied) = app
        .send(
            Method::POST,
            &format!("{}/deny", uri),
            As::Moderator,
            Some(json!({ "admin_comment": "Pitch looks wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(denied["data"]["status"], "denied");
    assert_eq!(denied["data"]["admin_comment"], "Pitch looks wrong");

    let mut edited = propeller("3020", 3);
    edited["pitch"] = json!(2.0);
    let (status, updated) = app
        .send(Method::PUT, &uri, As::User("user-1"), Some(edited))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["status"], "pending");
    assert_eq!(updated["data"]["pitch"], 2.0);

    let (status, _) = app.send(Method::DELETE, &uri, As::User("user-2"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::DELETE, &uri, As::User("user-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send(Method::GET, &uri, As::User("user-1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_last_suggested_detail_is_protected() {
    let app = test_app().await;
    let dipole = app
        .lookup(LookupData::AntennaType {
            name: "Dipole".to_string(),
            direction: Default::default(),
            polarization: Default::default(),
        })
        .await;
    let sma = app
        .lookup(LookupData::AntennaConnector {
            name: "SMA".to_string(),
        })
        .await;

    let (status, created) = app
        .send(
            Method::POST,
            "/api/suggestions/antenna",
            As::User("user-1"),
            Some(json!({
                "manufacturer": "Foxeer",
                "model": "Lollipop 4",
                "type": dipole,
                "center_frequency": 5800.0,
                "bandwidth_min": 5600.0,
                "bandwidth_max": 6000.0,
                "details": [{ "connector_type": sma, "weight": 5.0 }],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["data"]["id"].as_str().unwrap();
    let detail_id = created["data"]["details"][0]["id"].as_str().unwrap();

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/api/suggestions/antenna/{}/details/{}", id, detail_id),
            As::User("user-1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], LAST_DETAIL_MESSAGE);
}

#[tokio::test]
async fn test_private_catalog_items() {
    let app = test_app().await;
    let (status, created) = app
        .send(
            Method::POST,
            "/api/catalog/propeller",
            As::User("user-1"),
            Some(propeller("Private", 4)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["owner_id"], "user-1");
    let uri = format!(
        "/api/catalog/propeller/{}",
        created["data"]["id"].as_str().unwrap()
    );

    let (status, _) = app.send(Method::GET, &uri, As::User("user-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send(Method::GET, &uri, As::User("user-2"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, public) = app
        .send(Method::GET, "/api/catalog/propeller", As::Anonymous, None)
        .await;
    assert_eq!(public["data"]["total_items"], 0);
    let (_, own) = app
        .send(Method::GET, "/api/catalog/propeller", As::User("user-1"), None)
        .await;
    assert_eq!(own["data"]["total_items"], 1);
}

#[tokio::test]
async fn test_lookup_suggestion_round_trip() {
    let app = test_app().await;
    let (status, created) = app
        .send(
            Method::POST,
            "/api/lookup-suggestions/antenna_connector",
            As::User("user-1"),
            Some(json!({ "data": { "kind": "antenna_connector", "name": "MMCX" } })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["data"]["id"].as_str().unwrap();

    let (status, accepted) = app
        .send(
            Method::POST,
            &format!("/api/lookup-suggestions/antenna_connector/{}/accept", id),
            As::Moderator,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["data"]["name"], "MMCX");

    let (_, lookups) = app
        .send(Method::GET, "/api/lookups/antenna_connector", As::Anonymous, None)
        .await;
    let names: Vec<&str> = lookups["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["MMCX"]);
}

#[tokio::test]
async fn test_suggestion_attachments_follow_owner_visibility() {
    let app = test_app().await;
    let mut payload = propeller("Pictured", 5);
    payload["images"] = json!([{
        "file_name": "top.png",
        "content_type": "image/png",
        "data": BASE64.encode(b"\x89PNG top"),
    }]);

    let (status, created) = app
        .send(
            Method::POST,
            "/api/suggestions/propeller",
            As::User("user-1"),
            Some(payload),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let attachment_id = created["data"]["images"][0]["id"].as_str().unwrap();
    let uri = format!("/api/attachments/{}", attachment_id);

    let request = Request::builder()
        .uri(&uri)
        .header("x-user-id", "user-1")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"\x89PNG top");

    let (status, _) = app.send(Method::GET, &uri, As::User("user-2"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::GET, &uri, As::Anonymous, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn propeller_with_image(model: &str, image_bytes: usize) -> Value {
    let mut payload = propeller(model, 5);
    let mut body = b"\x89PNG\r\n\x1a\n".to_vec();
    body.resize(image_bytes, 0);
    payload["images"] = json!([{
        "file_name": "large.png",
        "data": BASE64.encode(&body),
    }]);
    payload
}

#[tokio::test]
async fn test_large_upload_within_limit_is_accepted() {
    let app = test_app().await;
    let size = 3 * 1024 * 1024;

    let (status, created) = app
        .send(
            Method::POST,
            "/api/suggestions/propeller",
            As::User("user-1"),
            Some(propeller_with_image("Heavy", size)),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["images"][0]["size_bytes"], size as u64);
}

#[tokio::test]
async fn test_upload_over_file_limit_is_field_error() {
    let limit = 64 * 1024;
    let app = test_app_with_upload_limit(limit).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/suggestions/propeller",
            As::User("user-1"),
            Some(propeller_with_image("Heavy", limit + 1)),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["details"]["images[0].data"][0].as_str().unwrap();
    assert!(message.starts_with("The submitted file is too large"));
}

#[tokio::test]
async fn test_oversized_body_uses_envelope() {
    let app = test_app_with_upload_limit(1024).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/suggestions/propeller",
            As::User("user-1"),
            Some(propeller_with_image("Heavy", 2 * 1024 * 1024)),
        )
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Request body is too large"));
}

#[tokio::test]
async fn test_favorites_lists() {
    let app = test_app().await;
    let (_, component) = app
        .send(
            Method::POST,
            "/api/catalog/propeller",
            As::Moderator,
            Some(propeller("5143", 5)),
        )
        .await;
    let component_id = component["data"]["id"].as_str().unwrap();

    let (status, list) = app
        .send(
            Method::POST,
            "/api/lists",
            As::User("user-1"),
            Some(json!({ "name": "5 inch build" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let list_id = list["data"]["id"].as_str().unwrap();
    let items_uri = format!("/api/lists/{}/items", list_id);

    let item = json!({ "component_kind": "propeller", "component_id": component_id });
    let (status, _) = app
        .send(Method::POST, &items_uri, As::User("user-1"), Some(item.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .send(Method::POST, &items_uri, As::User("user-1"), Some(item))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, items) = app
        .send(Method::GET, &items_uri, As::User("user-1"), None)
        .await;
    assert_eq!(items["data"].as_array().unwrap().len(), 1);

    let (_, counts) = app
        .send(
            Method::GET,
            &format!("/api/lists/{}/counts", list_id),
            As::User("user-1"),
            None,
        )
        .await;
    assert_eq!(counts["data"]["propeller"], 1);
    assert_eq!(counts["data"]["motor"], 0);

    let (status, _) = app
        .send(Method::GET, &items_uri, As::User("user-2"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
