//! Permission gate endpoints.
//!
//! Capability requests are expected to fail and be retried, so denials
//! come back as 200 responses carrying the classified reason rather than
//! HTTP errors. The UI polls the gate status to render the checklist.

use super::ApiState;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(gate_status))
        .route("/camera-mic", post(request_camera_mic))
        .route("/screen-share", post(request_screen_share))
        .route("/speaker/test", post(speaker_test))
        .route("/speaker/confirm", post(speaker_confirm))
        .with_state(state)
}

async fn gate_status(State(state): State<ApiState>) -> Json<Value> {
    Json(json!(state.gate.status().await))
}

async fn request_camera_mic(State(state): State<ApiState>) -> Json<Value> {
    info!("Camera/microphone access requested");
    let result = state.gate.request_camera_mic().await;
    outcome(&state, result).await
}

async fn request_screen_share(State(state): State<ApiState>) -> Json<Value> {
    info!("Screen share access requested");
    let result = state.gate.request_screen_share().await;
    outcome(&state, result).await
}

async fn speaker_test(State(state): State<ApiState>) -> Json<Value> {
    info!("Speaker test requested");
    let result = state.gate.start_speaker_test().await;
    outcome(&state, result).await
}

#[derive(Debug, Deserialize)]
struct SpeakerConfirmRequest {
    heard: bool,
}

async fn speaker_confirm(
    State(state): State<ApiState>,
    Json(request): Json<SpeakerConfirmRequest>,
) -> Json<Value> {
    state.gate.confirm_speaker(request.heard).await;
    outcome(&state, Ok(())).await
}

async fn outcome(
    state: &ApiState,
    result: Result<(), crate::media::MediaAccessError>,
) -> Json<Value> {
    let gate = state.gate.status().await;
    match result {
        Ok(()) => Json(json!({ "granted": true, "gate": gate })),
        Err(e) => Json(json!({
            "granted": false,
            "reason": e.to_string(),
            "kind": e.kind(),
            "gate": gate,
        })),
    }
}
