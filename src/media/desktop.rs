//! Desktop capture backend: cpal microphone + nokhwa webcam.

use crate::media::backend::{MediaBackend, MediaConstraints};
use crate::media::error::MediaAccessError;
use crate::media::stream::{MediaChunk, MediaStream, MediaTrack, TrackKind};
use crate::media::{mic, webcam};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Players tried in order for the speaker-test clip.
const PLAYBACK_TOOLS: &[&str] = &["paplay", "aplay"];

pub struct DesktopMediaBackend {
    chunk_interval: Duration,
}

impl DesktopMediaBackend {
    pub fn new(chunk_interval_ms: u64) -> Self {
        Self {
            chunk_interval: Duration::from_millis(chunk_interval_ms),
        }
    }
}

#[async_trait]
impl MediaBackend for DesktopMediaBackend {
    async fn request_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<MediaStream, MediaAccessError> {
        let chunk_interval = self.chunk_interval;

        // Device handshakes block; keep them off the runtime threads.
        tokio::task::spawn_blocking(move || acquire_user_media(constraints, chunk_interval))
            .await
            .map_err(|e| MediaAccessError::Unknown(format!("Capture task failed: {e}")))?
    }

    async fn request_display_media(&self) -> Result<MediaStream, MediaAccessError> {
        // There is no portable screen-capture pipeline here; the gate only
        // needs the grant and releases the tracks immediately, so probe for
        // a display session and hand out an inert track.
        let has_display =
            std::env::var_os("WAYLAND_DISPLAY").is_some() || std::env::var_os("DISPLAY").is_some();
        if !has_display {
            return Err(MediaAccessError::DeviceNotFound);
        }

        let (_tx, rx) = mpsc::unbounded_channel::<MediaChunk>();
        let track = MediaTrack::new(
            TrackKind::Video,
            "display",
            "video/x-raw",
            Arc::new(AtomicBool::new(false)),
            rx,
        );

        info!("Screen-share grant probe succeeded");
        Ok(MediaStream::new(vec![track]))
    }

    async fn play_clip(&self, clip: &Path) -> Result<(), MediaAccessError> {
        if !clip.exists() {
            return Err(MediaAccessError::Unknown(format!(
                "Speaker clip not found: {}",
                clip.display()
            )));
        }

        let clip: PathBuf = clip.to_path_buf();
        for tool in PLAYBACK_TOOLS {
            match tokio::process::Command::new(tool).arg(&clip).output().await {
                Ok(output) if output.status.success() => return Ok(()),
                Ok(output) => {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    warn!("{} failed to play clip: {}", tool, stderr.trim());
                    return Err(MediaAccessError::Unknown(format!(
                        "{tool} could not play the clip: {}",
                        stderr.trim()
                    )));
                }
                // Tool not installed; try the next one.
                Err(_) => continue,
            }
        }

        Err(MediaAccessError::DeviceNotFound)
    }
}

fn acquire_user_media(
    constraints: MediaConstraints,
    chunk_interval: Duration,
) -> Result<MediaStream, MediaAccessError> {
    let mut tracks = Vec::new();
    let mut level = None;

    if constraints.video {
        tracks.push(webcam::start_capture(chunk_interval)?);
    }

    if constraints.audio {
        match mic::start_capture(chunk_interval) {
            Ok((track, tap)) => {
                tracks.push(track);
                level = Some(tap);
            }
            Err(e) => {
                // Fail as a unit: nothing half-acquired may keep capturing.
                for track in &tracks {
                    track.stop();
                }
                return Err(e);
            }
        }
    }

    let mut stream = MediaStream::new(tracks);
    if let Some(tap) = level {
        stream = stream.with_level(tap);
    }
    Ok(stream)
}
