//! Common test utilities and fixtures for integration tests
#![allow(dead_code)]

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use backend::config::Config;
use backend::repository::Store;
use backend::state::AppState;

/// Spin up the full router over a fresh in-memory store.
pub fn test_server() -> TestServer {
    let config = Config::load().expect("Failed to load config");
    let state = AppState::new(config, Store::in_memory());
    TestServer::new(backend::build_router(state)).expect("Failed to start test server")
}

/// Bearer header pair for a session token.
pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("Invalid header value"),
    )
}

/// Create (or update) a user via /setup/user; returns (user, token).
pub async fn setup_user(server: &TestServer, email: &str, role: &str) -> (Value, String) {
    let response = server
        .post("/setup/user")
        .json(&json!({ "email": email, "role": role }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    let token = body["token"].as_str().expect("No token in response").to_string();
    (body["user"].clone(), token)
}

/// Admin fixture shared by the tests.
pub async fn setup_admin(server: &TestServer) -> String {
    let (_, token) = setup_user(server, "admin@example.test", "admin").await;
    token
}

/// Fund a player through the manual deposit flow: request plus admin approval.
pub async fn fund(server: &TestServer, admin_token: &str, player_token: &str, cents: u64) {
    let (name, value) = bearer(player_token);
    let response = server
        .post("/deposit/request")
        .add_header(name, value)
        .json(&json!({ "amount": cents, "method": "bank" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    let request_id = body["deposit"]["request_id"]
        .as_str()
        .expect("No request id")
        .to_string();

    let (name, value) = bearer(admin_token);
    let response = server
        .post("/admin/deposit/approve")
        .add_header(name, value)
        .json(&json!({ "request_id": request_id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

/// Start a round as admin and return its id.
pub async fn start_round(server: &TestServer, admin_token: &str) -> Uuid {
    let (name, value) = bearer(admin_token);
    let response = server
        .post("/admin/round/start")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    body["round_id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("No round id")
}

/// Place a bet and return the bet id and reported balance.
pub async fn place_bet(
    server: &TestServer,
    token: &str,
    round_id: Uuid,
    cents: u64,
) -> (Uuid, u64) {
    let (name, value) = bearer(token);
    let response = server
        .post("/bet/place")
        .add_header(name, value)
        .json(&json!({ "round_id": round_id, "amount": cents }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    let bet_id = body["bet"]["bet_id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("No bet id");
    (bet_id, body["balance"].as_u64().expect("No balance"))
}

/// Current balance via /me.
pub async fn balance_of(server: &TestServer, token: &str) -> u64 {
    let (name, value) = bearer(token);
    let response = server.get("/me").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    body["balance"].as_u64().expect("No balance")
}

/// Helper function to parse error response
pub fn parse_error(body: &Value) -> Option<(String, String, String)> {
    let error = body.get("error")?;

    Some((
        error.get("code")?.as_str()?.to_string(),
        error.get("message")?.as_str()?.to_string(),
        error.get("category")?.as_str()?.to_string(),
    ))
}
