//! Feedback collection endpoints.

use super::ApiState;
use crate::api::error::{ApiError, ApiResult};
use axum::{
    extract::State,
    response::Json,
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", post(submit_feedback).get(feedback_status))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    feedback: String,
}

async fn submit_feedback(
    State(state): State<ApiState>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<Json<Value>> {
    let accepted = state
        .feedback
        .submit(&request.feedback)
        .await
        .map_err(ApiError::bad_request)?;

    // Thank-you payload for the completion presentation.
    Ok(Json(json!({
        "submitted": true,
        "feedback": accepted,
        "recordings": state.feedback.recordings_summary().await,
    })))
}

async fn feedback_status(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "ready": state.feedback.ready().await,
        "feedback": state.feedback.feedback().await,
        "recordings": state.feedback.recordings_summary().await,
    }))
}
