//! HTTP client for querying a running rehearse service.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::session::{CapabilityReadiness, SessionState};

pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub session: SessionState,
    pub gate: GateSnapshot,
    pub feedback_ready: bool,
}

#[derive(Debug, Deserialize)]
pub struct GateSnapshot {
    pub readiness: CapabilityReadiness,
    pub ready: bool,
    pub missing: Vec<String>,
}

impl ServiceClient {
    pub fn new(port: u16) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://127.0.0.1:{}", port),
        }
    }

    pub async fn status(&self) -> Result<StatusResponse> {
        let response = self
            .client
            .get(format!("{}/status", self.base_url))
            .send()
            .await
            .context("Failed to reach the rehearse service. Is it running?")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Status request failed ({}): {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse status response")
    }
}
