//! HTTP routes over a shared `Banker`
//!
//! | Route           | Body                  | Response           |
//! |-----------------|-----------------------|--------------------|
//! | `GET /state`    |                       | `StateView`        |
//! | `GET /safety`   |                       | `SafetyReport`     |
//! | `POST /request` | `{ pid, request }`    | `DecisionReport`   |
//! | `POST /release` | `{ pid, release }`    | `StateView`        |
//! | `GET /journal`  |                       | `[JournalEvent]`   |
//! | `GET /commits`  |                       | `[Commit]`         |
//!
//! Every decision, including deny and wait, is a `200`. Malformed calls
//! are `400`; invariant or replay failures are `500`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use banker::report::DecisionReport;
use banker::{Banker, BankerError, Commit, JournalEvent, Snapshot};
use banker_core::{ProcessId, SafetyReport, SystemState};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

/// Shared allocator handle
pub type AppState = Arc<Banker>;

#[derive(Debug, Deserialize)]
pub struct RequestBody {
    pub pid: ProcessId,
    pub request: Vec<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseBody {
    pub pid: ProcessId,
    pub release: Vec<u32>,
}

/// Current state with its derived Need matrix
#[derive(Debug, Serialize, Deserialize)]
pub struct StateView {
    pub version: u64,
    pub state: SystemState,
    pub need: Vec<Vec<u32>>,
}

impl From<Snapshot> for StateView {
    fn from(Snapshot { version, state }: Snapshot) -> Self {
        let need = state.need().to_rows();
        Self {
            version,
            state,
            need,
        }
    }
}

/// `BankerError` rendered as a JSON error response
pub struct ApiError(BankerError);

impl From<BankerError> for ApiError {
    fn from(e: BankerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            BankerError::MalformedInput(_)
            | BankerError::InvalidState(_)
            | BankerError::InvalidRequest(_)
            | BankerError::InvalidRelease(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Build the router.
pub fn router(banker: AppState) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .route("/safety", get(get_safety))
        .route("/request", post(post_request))
        .route("/release", post(post_release))
        .route("/journal", get(get_journal))
        .route("/commits", get(get_commits))
        .layer(CorsLayer::permissive())
        .with_state(banker)
}

async fn get_state(State(banker): State<AppState>) -> Json<StateView> {
    Json(banker.versioned().into())
}

async fn get_safety(State(banker): State<AppState>) -> Json<SafetyReport> {
    Json(banker.safety())
}

async fn post_request(
    State(banker): State<AppState>,
    Json(body): Json<RequestBody>,
) -> Result<Json<DecisionReport>, ApiError> {
    let (decision, after) = banker.request_with_snapshot(body.pid, &body.request)?;
    Ok(Json(DecisionReport::new(
        body.pid,
        &body.request,
        &decision,
        after.state.available(),
    )))
}

async fn post_release(
    State(banker): State<AppState>,
    Json(body): Json<ReleaseBody>,
) -> Result<Json<StateView>, ApiError> {
    let committed = banker.release(body.pid, &body.release)?;
    Ok(Json(committed.into()))
}

async fn get_journal(State(banker): State<AppState>) -> Json<Vec<JournalEvent>> {
    Json(banker.journal())
}

async fn get_commits(State(banker): State<AppState>) -> Json<Vec<Commit>> {
    Json(banker.commits())
}
