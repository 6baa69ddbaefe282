#![allow(clippy::unwrap_used)]
// Integration tests for `RemoteClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dashboard_api::models::{CreateTodoRequest, InitRequest};
use dashboard_api::{Error, RemoteClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RemoteClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = RemoteClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn init_request() -> InitRequest {
    InitRequest {
        project_id: "home-dashboard".into(),
        target: "linux-x86_64".into(),
        client_version: "0.1.0".into(),
    }
}

async fn sign_in(server: &MockServer, client: &RemoteClient) {
    Mock::given(method("POST"))
        .and(path("/v1/auth/anonymous"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uid": "anon-1",
            "token": "tok-1",
            "anonymous": true
        })))
        .mount(server)
        .await;
    client.sign_in_anonymously().await.unwrap();
}

// ── Session tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_initialize_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/init"))
        .and(body_json(json!({
            "project_id": "home-dashboard",
            "target": "linux-x86_64",
            "client_version": "0.1.0"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "s-42",
            "server_time": "2026-02-10T12:00:00Z"
        })))
        .mount(&server)
        .await;

    let response = client.initialize(&init_request()).await.unwrap();
    assert_eq!(response.session_id, "s-42");
    assert!(response.server_time.is_some());
}

#[tokio::test]
async fn test_initialize_unsupported_target() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/init"))
        .respond_with(ResponseTemplate::new(412).set_body_json(json!({
            "error": { "code": "unsupported-target", "message": "no build for riscv64" }
        })))
        .mount(&server)
        .await;

    let result = client.initialize(&init_request()).await;
    match result {
        Err(Error::UnsupportedTarget { message }) => assert_eq!(message, "no build for riscv64"),
        other => panic!("expected UnsupportedTarget, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_initialize_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/init"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.initialize(&init_request()).await.unwrap_err();
    assert!(
        matches!(err, Error::Api { status: 503, .. }),
        "expected Api 503, got: {err:?}"
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_ping() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/health"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client.ping().await.unwrap();
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_anonymous_sign_in_caches_identity() {
    let (server, client) = setup().await;
    assert!(client.current_identity().is_none());

    sign_in(&server, &client).await;

    let identity = client.current_identity().unwrap();
    assert_eq!(identity.uid, "anon-1");
    assert!(identity.anonymous);
}

#[tokio::test]
async fn test_anonymous_sign_in_disabled() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/anonymous"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": "anonymous-auth-disabled", "message": "disabled for project" }
        })))
        .mount(&server)
        .await;

    let result = client.sign_in_anonymously().await;
    assert!(
        matches!(result, Err(Error::AnonymousAuthDisabled { .. })),
        "expected AnonymousAuthDisabled, got: {result:?}"
    );
    assert!(client.current_identity().is_none());
}

// ── Domain tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_todos_requires_identity() {
    let (_server, client) = setup().await;

    let result = client.list_todos().await;
    assert!(matches!(result, Err(Error::NotSignedIn)), "got: {result:?}");
}

#[tokio::test]
async fn test_list_and_create_todos_with_bearer() {
    let (server, client) = setup().await;
    sign_in(&server, &client).await;

    Mock::given(method("GET"))
        .and(path("/v1/users/anon-1/todos"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "t1",
            "title": "Water plants",
            "completed": false,
            "created": "2026-02-10T08:00:00Z"
        }])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/users/anon-1/todos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "t2",
            "title": "Call mum",
            "description": "",
            "completed": false,
            "created": "2026-02-10T09:00:00Z"
        })))
        .mount(&server)
        .await;

    let todos = client.list_todos().await.unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "Water plants");
    assert!(todos[0].description.is_empty());

    let created = client
        .create_todo(&CreateTodoRequest {
            title: "Call mum".into(),
            description: String::new(),
            due: None,
        })
        .await
        .unwrap();
    assert_eq!(created.id, "t2");
}

#[tokio::test]
async fn test_weather_passes_location() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/weather"))
        .and(query_param("location", "Oslo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "location": "Oslo",
            "temperature": -3.5,
            "humidity": 81.0,
            "conditions": "Snow",
            "updated": "2026-02-10T12:00:00Z"
        })))
        .mount(&server)
        .await;

    let weather = client.weather("Oslo").await.unwrap();
    assert_eq!(weather.location, "Oslo");
    assert!((weather.temperature - -3.5).abs() < f64::EPSILON);
    assert!(weather.icon_code.is_none());
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/streams"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client.streams().await;
    match result {
        Err(Error::Deserialization { body, .. }) => assert_eq!(body, "not json"),
        other => panic!("expected Deserialization, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_not_found_helper() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/feeds"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": "not-found", "message": "no feeds" }
        })))
        .mount(&server)
        .await;

    let err = client.feeds().await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.api_error_code(), Some("not-found"));
    assert!(!err.is_transient());
}
