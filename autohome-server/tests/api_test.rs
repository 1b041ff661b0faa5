use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use tower::ServiceExt;

use autohome_core::adapters::{Level, PinMode};
use autohome_core::mock::{PinOp, RecordingPinBank};

use crate::common::mock_app::MockApp;

mod common;

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_action_returns_display_text() {
    let app = MockApp::new();

    let response = app.router.oneshot(post("/ah/gate")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Gate: OK");
    assert_eq!(
        app.bank.ops(),
        vec![
            PinOp::Setup(18, PinMode::Output, Level::Low),
            PinOp::Write(18, Level::High),
            PinOp::Release(18),
        ]
    );
    assert_eq!(app.feedback.messages(), vec!["Opening or closing the gate"]);
}

#[tokio::test]
async fn test_sensor_report() {
    let app = MockApp::new();

    let response = app.router.oneshot(post("/ah/temperature")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Zewnatrz: -2.5°C\nParter: -\nStrych: -");
}

#[tokio::test]
async fn test_action_without_output_has_empty_body() {
    let app = MockApp::new();

    // Garage door is closed, nothing to do.
    let response = app.router.oneshot(post("/ah/garage_close")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.is_empty());
    assert!(app.bank.ops().is_empty());
}

#[tokio::test]
async fn test_unknown_action_is_not_found() {
    let app = MockApp::new();

    let response = app.router.oneshot(post("/ah/nonexistent_action")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.is_empty());
    assert!(app.bank.ops().is_empty());
}

#[tokio::test]
async fn test_action_name_is_matched_exactly() {
    let app = MockApp::new();

    let response = app.router.oneshot(post("/ah/Gate")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_prefix_is_not_routed() {
    let app = MockApp::new();

    let response = app.router.oneshot(post("/home/gate")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.bank.ops().is_empty());
}

#[tokio::test]
async fn test_relay_failure_is_internal_error() {
    let app = MockApp::with_bank(RecordingPinBank::new().failing_writes());

    let response = app.router.oneshot(post("/ah/garage")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"]["code"], 500);
    assert_eq!(body["error"]["message"], "Internal server error");
    assert!(body["error"]["error_id"].is_string());
    assert_eq!(app.bank.ops().last(), Some(&PinOp::Release(25)));
}
