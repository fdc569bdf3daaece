//! Session state and shared status handle.

use crate::session::phase::Phase;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Current session state, readable by API handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    pub attempt_id: uuid::Uuid,
    pub current_question: usize,
    pub total_questions: usize,
    /// Seconds left in the current answer window.
    pub time_remaining: u32,
    pub recording_active: bool,
    pub recordings_submitted: usize,
    pub last_error: Option<String>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            attempt_id: uuid::Uuid::new_v4(),
            current_question: 0,
            total_questions: 0,
            time_remaining: 0,
            recording_active: false,
            recordings_submitted: 0,
            last_error: None,
            started_at: None,
        }
    }
}

/// Thread-safe handle for sharing session state between the controller
/// task and API handlers.
#[derive(Clone, Default)]
pub struct SessionStatusHandle {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionStatusHandle {
    pub async fn get(&self) -> SessionState {
        self.inner.lock().await.clone()
    }

    pub async fn set_phase(&self, phase: Phase) {
        let mut state = self.inner.lock().await;
        state.phase = phase;
    }

    pub async fn begin_interview(&self, total_questions: usize) {
        let mut state = self.inner.lock().await;
        state.phase = Phase::Loading;
        state.current_question = 0;
        state.total_questions = total_questions;
        state.recordings_submitted = 0;
        state.started_at = Some(chrono::Utc::now());
        state.last_error = None;
    }

    pub async fn begin_answer(&self, question: usize, window_seconds: u32) {
        let mut state = self.inner.lock().await;
        state.phase = Phase::Recording;
        state.current_question = question;
        state.time_remaining = window_seconds;
        state.recording_active = true;
        state.last_error = None;
    }

    pub async fn set_time_remaining(&self, seconds: u32) {
        let mut state = self.inner.lock().await;
        state.time_remaining = seconds;
    }

    pub async fn begin_submit(&self) {
        let mut state = self.inner.lock().await;
        state.phase = Phase::Submitting;
        state.recording_active = false;
        state.time_remaining = 0;
    }

    pub async fn answer_submitted(&self, recordings_submitted: usize, next_question: Option<usize>) {
        let mut state = self.inner.lock().await;
        state.recordings_submitted = recordings_submitted;
        match next_question {
            Some(question) => {
                state.phase = Phase::Loading;
                state.current_question = question;
            }
            None => {
                state.phase = Phase::Complete;
            }
        }
    }

    pub async fn set_error(&self, error: String) {
        let mut state = self.inner.lock().await;
        state.phase = Phase::Errored;
        state.recording_active = false;
        state.last_error = Some(error);
    }
}

/// Shared handle to the live microphone level of the active recording.
///
/// Holds the monitor's receiver while a recording is active; `current`
/// reads 0 otherwise.
#[derive(Clone, Default)]
pub struct AudioLevelHandle {
    inner: Arc<std::sync::Mutex<Option<watch::Receiver<u8>>>>,
}

impl AudioLevelHandle {
    pub fn attach(&self, rx: watch::Receiver<u8>) {
        if let Ok(mut inner) = self.inner.lock() {
            *inner = Some(rx);
        }
    }

    pub fn detach(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            *inner = None;
        }
    }

    pub fn current(&self) -> u8 {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.as_ref().map(|rx| *rx.borrow()))
            .unwrap_or(0)
    }
}
