//! Developer-facing export of answer recordings.
//!
//! Writes each finalized answer's two blobs as files named by question
//! number, grouped per interview attempt.

use crate::session::recording::Recording;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

pub struct RecordingExporter {
    dir: PathBuf,
}

impl RecordingExporter {
    /// Exports land under `<dir>/<attempt-id>/`.
    pub fn new(dir: PathBuf, attempt_id: uuid::Uuid) -> Self {
        Self {
            dir: dir.join(attempt_id.to_string()),
        }
    }

    pub fn export(&self, recording: &Recording) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context("Failed to create export directory")?;

        let number = recording.question_index + 1;
        let video_path = self
            .dir
            .join(format!("question_{}_video.{}", number, recording.video.extension()));
        let audio_path = self
            .dir
            .join(format!("question_{}_audio.{}", number, recording.audio.extension()));

        std::fs::write(&video_path, &recording.video.data)
            .with_context(|| format!("Failed to write {:?}", video_path))?;
        std::fs::write(&audio_path, &recording.audio.data)
            .with_context(|| format!("Failed to write {:?}", audio_path))?;

        info!(
            "Exported question {} recordings to {:?}",
            number, self.dir
        );
        Ok(())
    }
}
