//! Recording lifecycle for one question.
//!
//! Owns the live media handles for the current question: the combined
//! stream, one chunked recorder per track kind and the audio level
//! monitor. Handles are released unconditionally on every exit path —
//! submit, error or teardown — so no camera or microphone lock leaks into
//! the next question. At most one recording is ever live.

use crate::media::{
    AudioLevelMonitor, MediaAccessError, MediaBackend, MediaBlob, MediaConstraints, MediaStream,
    TrackKind, TrackRecorder,
};
use anyhow::{bail, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// A finalized answer: one blob per track kind, index-aligned with the
/// question list. Immutable once created.
#[derive(Debug, Clone)]
pub struct Recording {
    pub question_index: usize,
    pub video: MediaBlob,
    pub audio: MediaBlob,
}

struct ActiveRecording {
    question_index: usize,
    stream: MediaStream,
    video: TrackRecorder,
    audio: TrackRecorder,
    active: watch::Sender<bool>,
    monitor: Option<AudioLevelMonitor>,
}

pub struct RecordingSession {
    backend: Arc<dyn MediaBackend>,
    active: Option<ActiveRecording>,
}

impl RecordingSession {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Live microphone level tap, if a recording is active.
    pub fn level(&self) -> Option<watch::Receiver<u8>> {
        self.active
            .as_ref()
            .and_then(|rec| rec.monitor.as_ref().map(|m| m.subscribe()))
    }

    /// Acquire a fresh combined stream and start both recorders.
    ///
    /// Any prior handles are torn down first. Fails as a unit: if either
    /// track kind is missing from the granted stream, everything acquired
    /// is stopped before the error is surfaced.
    pub async fn start(&mut self, question_index: usize) -> Result<(), MediaAccessError> {
        self.teardown();

        let mut stream = self
            .backend
            .request_user_media(MediaConstraints::audio_video())
            .await?;

        if !stream.has_kind(TrackKind::Video) || !stream.has_kind(TrackKind::Audio) {
            stream.stop_all();
            return Err(MediaAccessError::ConstraintsUnsatisfiable);
        }

        let video = Self::recorder_for(&mut stream, TrackKind::Video)?;
        let audio = match Self::recorder_for(&mut stream, TrackKind::Audio) {
            Ok(recorder) => recorder,
            Err(e) => {
                stream.stop_all();
                video.abort();
                return Err(e);
            }
        };

        let (active_tx, active_rx) = watch::channel(true);
        let monitor = stream
            .level_tap()
            .map(|tap| AudioLevelMonitor::start(tap, active_rx));

        info!("Recording started for question {}", question_index + 1);

        self.active = Some(ActiveRecording {
            question_index,
            stream,
            video,
            audio,
            active: active_tx,
            monitor,
        });

        Ok(())
    }

    /// Stop chunk delivery and the level monitor. Idempotent; safe when
    /// nothing is recording. Handles stay around for `finalize`.
    pub fn stop(&mut self) {
        if let Some(rec) = &self.active {
            rec.stream.stop_all();
            let _ = rec.active.send(false);
        }
    }

    /// Stop, concatenate each recorder's chunks and release every handle.
    pub async fn finalize(&mut self) -> Result<Recording> {
        self.stop();

        let Some(rec) = self.active.take() else {
            bail!("No active recording to finalize");
        };

        let question_index = rec.question_index;
        // The stream drops (and with it every track) regardless of how the
        // recorders fare.
        let ActiveRecording {
            stream,
            video,
            audio,
            monitor,
            ..
        } = rec;
        drop(monitor);

        let video = video.finalize().await;
        let audio = audio.finalize().await;
        drop(stream);

        let recording = Recording {
            question_index,
            video: video?,
            audio: audio?,
        };

        debug!(
            "Question {} finalized: video {} bytes, audio {} bytes",
            question_index + 1,
            recording.video.len(),
            recording.audio.len()
        );

        Ok(recording)
    }

    /// Release all handles without producing a recording. Idempotent.
    pub fn teardown(&mut self) {
        if let Some(rec) = self.active.take() {
            warn!(
                "Tearing down live recording for question {}",
                rec.question_index + 1
            );
            rec.stream.stop_all();
            let _ = rec.active.send(false);
            rec.video.abort();
            rec.audio.abort();
        }
    }

    fn recorder_for(
        stream: &mut MediaStream,
        kind: TrackKind,
    ) -> Result<TrackRecorder, MediaAccessError> {
        let track = stream
            .track_mut(kind)
            .ok_or_else(|| MediaAccessError::Unknown(format!("Missing {} track", kind.as_str())))?;
        let mime = track.mime().to_string();
        let chunks = track.take_chunks().ok_or_else(|| {
            MediaAccessError::Unknown(format!("{} track already consumed", kind.as_str()))
        })?;
        Ok(TrackRecorder::start(kind, mime, chunks))
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
