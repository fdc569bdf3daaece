//! Post-interview feedback collection.
//!
//! Receives the finalized recordings when the question loop completes and
//! accepts one round of free-text feedback, validated for minimum length.
//! The accepted text doubles as the thank-you presentation payload.

use crate::session::recording::Recording;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Shorter submissions are asked to elaborate.
pub const MIN_FEEDBACK_CHARS: usize = 10;

/// Per-question sizes exposed to status consumers; the blobs themselves
/// stay in memory.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingSummary {
    pub question_index: usize,
    pub video_bytes: usize,
    pub audio_bytes: usize,
}

#[derive(Default)]
struct CollectorState {
    recordings: Option<Vec<Recording>>,
    feedback: Option<String>,
}

#[derive(Clone, Default)]
pub struct FeedbackCollector {
    inner: Arc<Mutex<CollectorState>>,
}

impl FeedbackCollector {
    /// Hand over the completed interview's recordings.
    pub async fn deliver_recordings(&self, recordings: Vec<Recording>) {
        info!("Received {} recordings for feedback", recordings.len());
        self.inner.lock().await.recordings = Some(recordings);
    }

    /// Whether the interview has completed and feedback can be taken.
    pub async fn ready(&self) -> bool {
        self.inner.lock().await.recordings.is_some()
    }

    /// Validate and accept feedback text. Returns the accepted text.
    pub async fn submit(&self, text: &str) -> Result<String, String> {
        let mut state = self.inner.lock().await;
        if state.recordings.is_none() {
            return Err("The interview is not complete yet".to_string());
        }

        let trimmed = text.trim();
        if trimmed.chars().count() < MIN_FEEDBACK_CHARS {
            return Err("Please provide more detailed feedback".to_string());
        }

        let accepted = trimmed.to_string();
        state.feedback = Some(accepted.clone());
        info!("Feedback submitted: {} chars", accepted.len());
        Ok(accepted)
    }

    pub async fn feedback(&self) -> Option<String> {
        self.inner.lock().await.feedback.clone()
    }

    pub async fn recordings_summary(&self) -> Vec<RecordingSummary> {
        self.inner
            .lock()
            .await
            .recordings
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|r| RecordingSummary {
                question_index: r.question_index,
                video_bytes: r.video.len(),
                audio_bytes: r.audio.len(),
            })
            .collect()
    }
}
