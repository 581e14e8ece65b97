//! API integration tests for sdwan-controller.
//!
//! The router is driven in-process through tower's `oneshot` with a recording
//! runner in place of `tc`.

use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use sdwan_common::{LogLevel, Logger};
use sdwan_controller::api::{self, ControllerState};
use sdwan_controller::receiver::{InterfaceImpairmentReceiver, InterfaceMap};
use sdwan_controller::tc::{InterfaceName, QdiscPhase};
use sdwan_controller::test_util::RecordingRunner;

fn test_app(runner: Arc<RecordingRunner>) -> Router {
    let interfaces = InterfaceMap::new(
        InterfaceName::new("eth0").unwrap(),
        InterfaceName::new("eth1").unwrap(),
    )
    .unwrap();
    let receiver = InterfaceImpairmentReceiver::new(interfaces, runner, Logger::new(LogLevel::Info));
    api::router(ControllerState {
        receiver: Arc::new(receiver),
    })
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(&bytes);
        panic!("not valid JSON: {text}");
    })
}

fn form_post(body: &str) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .uri("/")
        .method("POST")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let app = test_app(Arc::new(RecordingRunner::new()));
    let req = axum::http::Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(json_body(resp).await["status"], "ok");
}

#[tokio::test]
async fn full_form_applies_six_commands() {
    let runner = Arc::new(RecordingRunner::new());
    let app = test_app(runner.clone());

    let resp = app
        .oneshot(form_post(
            "download=100&upload=100&packetLoss=100&latency=100&jitter=100",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = json_body(resp).await;
    let phases = body["phases"].as_array().unwrap();
    assert_eq!(phases.len(), 6);
    assert_eq!(phases[0]["phase"], "clear");
    assert_eq!(phases[1]["phase"], "rate_limit");
    assert_eq!(phases[2]["phase"], "inject");
    assert_eq!(phases[3]["interface"], "eth1");
    assert!(phases.iter().all(|p| p["success"] == true));

    let cmds = runner.commands();
    assert_eq!(cmds.len(), 6);
    assert_eq!(cmds[0].dev().as_str(), "eth0");
    assert_eq!(cmds[3].dev().as_str(), "eth1");
}

#[tokio::test]
async fn missing_parameter_is_rejected_before_any_command() {
    let runner = Arc::new(RecordingRunner::new());
    let app = test_app(runner.clone());

    let resp = app
        .oneshot(form_post("download=10&upload=1&packetLoss=5&latency=52"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body = json_body(resp).await;
    assert!(body["error"].as_str().unwrap().contains("jitter"));
    assert!(runner.commands().is_empty());
}

#[tokio::test]
async fn non_numeric_parameter_is_rejected() {
    let runner = Arc::new(RecordingRunner::new());
    let app = test_app(runner.clone());

    let resp = app
        .oneshot(form_post(
            "download=10&upload=1&packetLoss=5&latency=52%3Breboot&jitter=20",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(runner.commands().is_empty());
}

#[tokio::test]
async fn command_failures_still_return_ok() {
    let runner = Arc::new(RecordingRunner::failing(QdiscPhase::RateLimit));
    let app = test_app(runner.clone());

    let resp = app
        .oneshot(form_post(
            "download=10&upload=1&packetLoss=0&latency=30&jitter=0",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = json_body(resp).await;
    let phases = body["phases"].as_array().unwrap();
    assert_eq!(phases[0]["success"], true);
    assert_eq!(phases[1]["success"], false);
    assert!(phases[1]["error"].is_string());
    assert_eq!(phases[2]["success"], true);
    assert_eq!(runner.commands().len(), 6);
}

#[tokio::test]
async fn first_apply_after_boot_reports_success() {
    let runner = Arc::new(RecordingRunner::kernel_like());
    let app = test_app(runner.clone());

    let resp = app
        .oneshot(form_post(
            "download=50&upload=10&packetLoss=0&latency=30&jitter=0",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = json_body(resp).await;
    let phases = body["phases"].as_array().unwrap();
    assert!(phases.iter().all(|p| p["success"] == true));
    assert!(phases.iter().all(|p| p.get("error").is_none()));
}
