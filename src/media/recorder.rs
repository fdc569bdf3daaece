//! Chunked track recorder.
//!
//! One recorder per track: it drains the track's chunk channel into an
//! ordered buffer as chunks arrive, and concatenates them into a single
//! blob on finalize. The capture side drops its sender once the track is
//! stopped, which ends the drain task.

use crate::media::stream::{MediaChunk, TrackKind};
use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// A finalized, immutable media object.
#[derive(Debug, Clone)]
pub struct MediaBlob {
    pub mime: String,
    pub data: Vec<u8>,
}

impl MediaBlob {
    /// File extension matching the blob's content type.
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "audio/wav" | "audio/x-wav" => "wav",
            "audio/webm" | "video/webm" => "webm",
            "video/x-motion-jpeg" => "mjpeg",
            _ => "bin",
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

pub struct TrackRecorder {
    kind: TrackKind,
    mime: String,
    chunks: Arc<Mutex<Vec<MediaChunk>>>,
    drain: Option<JoinHandle<()>>,
}

impl TrackRecorder {
    /// Start draining chunks from a live track.
    pub fn start(
        kind: TrackKind,
        mime: impl Into<String>,
        mut rx: mpsc::UnboundedReceiver<MediaChunk>,
    ) -> Self {
        let chunks = Arc::new(Mutex::new(Vec::new()));
        let buffer = Arc::clone(&chunks);

        let drain = tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                if chunk.is_empty() {
                    continue;
                }
                if let Ok(mut buffer) = buffer.lock() {
                    buffer.push(chunk);
                }
            }
        });

        Self {
            kind,
            mime: mime.into(),
            chunks,
            drain: Some(drain),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// Wait for the drain task to deliver the remaining chunks and
    /// concatenate them into one blob. The track must be stopped first so
    /// the capture side closes its channel.
    pub async fn finalize(mut self) -> Result<MediaBlob> {
        if let Some(drain) = self.drain.take() {
            drain
                .await
                .with_context(|| format!("{} recorder drain task panicked", self.kind.as_str()))?;
        }

        let chunks = self
            .chunks
            .lock()
            .map_err(|_| anyhow::anyhow!("Recorder chunk buffer poisoned"))?;

        let total: usize = chunks.iter().map(|c| c.len()).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in chunks.iter() {
            data.extend_from_slice(chunk);
        }

        debug!(
            "Finalized {} recording: {} chunks, {} bytes",
            self.kind.as_str(),
            chunks.len(),
            total
        );

        Ok(MediaBlob {
            mime: self.mime.clone(),
            data,
        })
    }

    /// Drop any pending drain work without finalizing.
    pub fn abort(mut self) {
        if let Some(drain) = self.drain.take() {
            drain.abort();
        }
    }
}
