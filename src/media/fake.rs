//! Scripted capture backend for tests.

use crate::media::backend::{MediaBackend, MediaConstraints};
use crate::media::error::MediaAccessError;
use crate::media::stream::{MediaChunk, MediaStream, MediaTrack, TrackKind};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Outcome of the next `request_user_media` call.
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    /// Grant a stream with the given track kinds.
    Grant { video: bool, audio: bool },
    /// Fail the request.
    Deny(MediaAccessError),
}

#[derive(Default)]
struct FakeState {
    /// Scripted outcomes, consumed front-to-back. When empty, requests are
    /// granted with both kinds.
    plan: VecDeque<FakeOutcome>,
    /// Stop flags of every track ever issued, for release assertions.
    issued: Vec<(TrackKind, Arc<AtomicBool>)>,
    played_clips: Vec<PathBuf>,
    display_outcome: Option<MediaAccessError>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, outcome: FakeOutcome) {
        self.state.lock().unwrap().plan.push_back(outcome);
    }

    pub fn deny_display(&self, err: MediaAccessError) {
        self.state.lock().unwrap().display_outcome = Some(err);
    }

    pub fn played_clips(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().played_clips.clone()
    }

    pub fn issued_tracks(&self) -> Vec<(TrackKind, Arc<AtomicBool>)> {
        self.state.lock().unwrap().issued.clone()
    }

    pub fn all_issued_stopped(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .issued
            .iter()
            .all(|(_, stopped)| stopped.load(Ordering::SeqCst))
    }

    fn make_track(&self, kind: TrackKind) -> MediaTrack {
        let (tx, rx) = mpsc::unbounded_channel::<MediaChunk>();
        let stopped = Arc::new(AtomicBool::new(false));
        self.state
            .lock()
            .unwrap()
            .issued
            .push((kind, Arc::clone(&stopped)));

        let marker: u8 = match kind {
            TrackKind::Video => 0xF1,
            TrackKind::Audio => 0xF2,
        };

        let stopped_for_task = Arc::clone(&stopped);
        tokio::spawn(async move {
            let mut seq: u8 = 0;
            while !stopped_for_task.load(Ordering::SeqCst) {
                if tx.send(vec![marker, seq]).is_err() {
                    break;
                }
                seq = seq.wrapping_add(1);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            // Sender drops here, closing the recorder's channel.
        });

        let mime = match kind {
            TrackKind::Video => "video/webm",
            TrackKind::Audio => "audio/webm",
        };
        MediaTrack::new(kind, format!("fake-{}", kind.as_str()), mime, stopped, rx)
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    async fn request_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<MediaStream, MediaAccessError> {
        let outcome = self
            .state
            .lock()
            .unwrap()
            .plan
            .pop_front()
            .unwrap_or(FakeOutcome::Grant {
                video: true,
                audio: true,
            });

        let (video, audio) = match outcome {
            FakeOutcome::Deny(err) => return Err(err),
            FakeOutcome::Grant { video, audio } => {
                (video && constraints.video, audio && constraints.audio)
            }
        };

        let mut tracks = Vec::new();
        if video {
            tracks.push(self.make_track(TrackKind::Video));
        }
        let mut level = None;
        if audio {
            tracks.push(self.make_track(TrackKind::Audio));
            let (tx, rx) = watch::channel(128u8);
            // Keep the tap alive for the stream's lifetime.
            tokio::spawn(async move {
                let _tx = tx;
                tokio::time::sleep(Duration::from_secs(3600)).await;
            });
            level = Some(rx);
        }

        let mut stream = MediaStream::new(tracks);
        if let Some(tap) = level {
            stream = stream.with_level(tap);
        }
        Ok(stream)
    }

    async fn request_display_media(&self) -> Result<MediaStream, MediaAccessError> {
        if let Some(err) = self.state.lock().unwrap().display_outcome.clone() {
            return Err(err);
        }
        let track = self.make_track(TrackKind::Video);
        Ok(MediaStream::new(vec![track]))
    }

    async fn play_clip(&self, clip: &Path) -> Result<(), MediaAccessError> {
        self.state
            .lock()
            .unwrap()
            .played_clips
            .push(clip.to_path_buf());
        Ok(())
    }
}
