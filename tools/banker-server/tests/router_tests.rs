//! Router tests
//!
//! Each test builds the router over a fresh allocator and drives it with
//! `oneshot`, without binding a socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use banker::{descriptor, Banker};
use banker_core::ProcessId;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const CLASSIC: &str = "5 3\n0 1 0\n2 0 0\n3 0 2\n2 1 1\n0 0 2\n7 5 3\n3 2 2\n9 0 2\n2 2 2\n4 3 3\n3 3 2\n";

fn app() -> Router {
    let state = descriptor::parse(CLASSIC).unwrap();
    banker_server::router(Arc::new(Banker::new(state)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_get_state_and_safety() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 0);
    assert_eq!(body["state"]["available"], json!([3, 3, 2]));
    assert_eq!(body["need"][0], json!([7, 4, 3]));

    let (status, body) = send(&app, Method::GET, "/safety", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["safe"], true);
    assert_eq!(body["sequence"], json!([1, 3, 4, 0, 2]));
}

#[tokio::test]
async fn test_request_decisions() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/request",
        Some(json!({ "pid": 1, "request": [1, 0, 2] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["line"], "GRANT");
    assert_eq!(body["available"], json!([2, 3, 0]));

    let (_, body) = send(
        &app,
        Method::POST,
        "/request",
        Some(json!({ "pid": 4, "request": [3, 3, 0] })),
    )
    .await;
    assert_eq!(body["line"], "WAIT(InsufficientAvailable)");

    let (_, body) = send(
        &app,
        Method::POST,
        "/request",
        Some(json!({ "pid": 0, "request": [0, 2, 0] })),
    )
    .await;
    assert_eq!(body["line"], "DENY(UnsafeState)");

    let (_, body) = send(&app, Method::GET, "/commits", None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(&app, Method::GET, "/journal", None).await;
    assert_eq!(body.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_malformed_request_is_bad_request() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/request",
        Some(json!({ "pid": 9, "request": [0, 0, 0] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("P9"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/request",
        Some(json!({ "pid": 1, "request": [1, 0] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_release_returns_new_state() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/release",
        Some(json!({ "pid": 2, "release": [3, 0, 2] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 1);
    assert_eq!(body["state"]["available"], json!([6, 3, 4]));

    let (status, _) = send(
        &app,
        Method::POST,
        "/release",
        Some(json!({ "pid": 0, "release": [1, 0, 0] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_state_version_matches_state_under_concurrent_commits() {
    // One process, one unit: odd versions hold the unit, even ones do not.
    let state = descriptor::parse("1 1\n0\n1\n1\n").unwrap();
    let banker = Arc::new(Banker::new(state));
    let app = banker_server::router(Arc::clone(&banker));

    let worker = {
        let banker = Arc::clone(&banker);
        std::thread::spawn(move || {
            for _ in 0..2_000 {
                assert!(banker.request(ProcessId(0), &[1]).unwrap().is_grant());
                let released = banker.release(ProcessId(0), &[1]).unwrap();
                assert_eq!(released.version % 2, 0);
                assert_eq!(released.state.allocation_of(ProcessId(0)), Some(&[0][..]));
            }
        })
    };

    let mut polls = 0;
    while !worker.is_finished() || polls == 0 {
        let (status, body) = send(&app, Method::GET, "/state", None).await;
        assert_eq!(status, StatusCode::OK);

        let version = body["version"].as_u64().unwrap();
        let held = body["state"]["allocation"][0][0].as_u64().unwrap();
        assert_eq!(held, version % 2, "version {} paired with allocation {}", version, held);
        polls += 1;
    }
    worker.join().unwrap();

    let (_, body) = send(&app, Method::GET, "/state", None).await;
    assert_eq!(body["version"], 4_000);
}
