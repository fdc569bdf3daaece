//! REST API server for the rehearsal session.
//!
//! Provides HTTP endpoints for:
//! - Permission gate control (camera/mic, screen share, speaker test)
//! - Session control (start, answer, submit, retry) and status
//! - Feedback collection

pub mod error;
pub mod routes;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tracing::info;

pub use routes::ApiState;

pub struct ApiServer {
    port: u16,
    state: ApiState,
}

impl ApiServer {
    pub fn new(port: u16, state: ApiState) -> Self {
        Self { port, state }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            .route("/", get(service_info))
            .route("/version", get(version))
            .merge(routes::session::router(self.state.clone()))
            .nest("/permissions", routes::permissions::router(self.state.clone()))
            .nest("/feedback", routes::feedback::router(self.state))
            .layer(ServiceBuilder::new());

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("API server listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  GET  /                         - Service info");
        info!("  GET  /status                   - Session + gate snapshot");
        info!("  GET  /questions                - Question list");
        info!("  GET  /level                    - Live microphone level");
        info!("  GET  /permissions              - Gate readiness");
        info!("  POST /permissions/camera-mic   - Request camera + microphone");
        info!("  POST /permissions/screen-share - Request screen share");
        info!("  POST /permissions/speaker/test - Play the speaker test clip");
        info!("  POST /permissions/speaker/confirm - Confirm audibility");
        info!("  POST /session/start            - Start the interview");
        info!("  POST /session/answer           - Begin answering");
        info!("  POST /session/submit           - Submit the current answer");
        info!("  POST /session/retry            - Retry after an error");
        info!("  POST /feedback                 - Submit feedback");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "service": "rehearse",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "rehearse"
    }))
}
