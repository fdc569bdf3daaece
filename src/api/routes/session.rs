//! Session control and status endpoints.

use super::ApiState;
use crate::api::error::{ApiError, ApiResult};
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tracing::info;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/questions", get(questions))
        .route("/level", get(level))
        .route("/session/start", post(start))
        .route("/session/answer", post(begin_answer))
        .route("/session/submit", post(submit))
        .route("/session/retry", post(retry))
        .with_state(state)
}

/// Full snapshot: session state, gate readiness and feedback progress.
async fn status(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "session": state.status.get().await,
        "gate": state.gate.status().await,
        "feedback_ready": state.feedback.ready().await,
    }))
}

async fn questions(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "count": state.questions.len(),
        "questions": state.questions.iter().collect::<Vec<_>>(),
    }))
}

/// Live microphone amplitude (0-255); 0 while not recording.
async fn level(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({ "level": state.level.current() }))
}

async fn start(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    info!("Interview start requested");
    let session = state.controller.start().await.map_err(ApiError::conflict)?;
    Ok(Json(json!({ "session": session })))
}

async fn begin_answer(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    let session = state
        .controller
        .begin_answer()
        .await
        .map_err(ApiError::conflict)?;
    Ok(Json(json!({ "session": session })))
}

async fn submit(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    let session = state.controller.submit().await.map_err(ApiError::conflict)?;
    Ok(Json(json!({ "session": session })))
}

async fn retry(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    info!("Retry requested");
    let session = state.controller.retry().await.map_err(ApiError::conflict)?;
    Ok(Json(json!({ "session": session })))
}
