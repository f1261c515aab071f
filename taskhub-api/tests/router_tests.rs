/// Router tests that run without a database
///
/// Every request here is rejected (or answered) before a connection is needed.

mod common;

use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_protected_routes_require_bearer() {
    let app = TestApp::offline();

    for (method, uri) in [
        (Method::GET, "/projects"),
        (Method::POST, "/projects"),
        (Method::GET, "/tasks/7b1f2a1e-3b7e-4c43-9a3d-2d5d8c1f0a11"),
        (Method::POST, "/tasks/asign-user-to/7b1f2a1e-3b7e-4c43-9a3d-2d5d8c1f0a11"),
        (Method::GET, "/user"),
        (Method::DELETE, "/user"),
    ] {
        let (status, body) = app.json(method.clone(), uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["code"], "unauthorized");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_malformed_authorization_header() {
    let app = TestApp::offline();

    let request = Request::builder()
        .uri("/projects")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let app = TestApp::offline();

    let (status, body) = app
        .json(Method::GET, "/projects", Some("not.a.jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = TestApp::offline();

    let (status, body) = app
        .json(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": "nope", "password": "abc", "name": "Ana" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password"]);
}

#[tokio::test]
async fn test_register_missing_field_is_bad_request() {
    let app = TestApp::offline();

    let (status, body) = app
        .json(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": "ana@example.com", "password": "secret123" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn test_login_rejects_invalid_email_format() {
    let app = TestApp::offline();

    let (status, _) = app
        .json(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "ana", "password": "secret123" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_email_with_invalid_token() {
    let app = TestApp::offline();

    let (status, body) = app
        .json(Method::GET, "/auth/verify-email?token=garbage", None, None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid verification token");
}

#[tokio::test]
async fn test_verify_email_without_token_is_json_error() {
    let app = TestApp::offline();

    let (status, body) = app
        .json(Method::GET, "/auth/verify-email", None, None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
    assert!(body["error"].as_str().unwrap().contains("token"));
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let app = TestApp::offline();

    let (status, body) = app.json(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let app = TestApp::offline();

    let response = tower::ServiceExt::oneshot(
        app.app.clone(),
        Request::builder().uri("/projects").body(Body::empty()).unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::offline();

    let (status, _) = app.json(Method::GET, "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
