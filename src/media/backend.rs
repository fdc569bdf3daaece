//! Capture backend abstraction.
//!
//! The session controller never touches devices directly; it goes through
//! this trait. The desktop implementation captures real microphone and
//! webcam input, tests inject a scripted backend.

use crate::media::error::MediaAccessError;
use crate::media::stream::MediaStream;
use async_trait::async_trait;
use std::path::Path;

/// Which track kinds a user-media request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

impl MediaConstraints {
    pub fn audio_video() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

/// Trait for platform media primitives (camera/microphone acquisition,
/// screen-share probe, speaker playback).
///
/// `request_user_media` must fail as a unit: either every requested track
/// kind is live in the returned stream, or nothing is left capturing.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Acquire a combined camera/microphone stream.
    async fn request_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<MediaStream, MediaAccessError>;

    /// Probe the screen-share grant. The caller releases the returned
    /// tracks immediately; only the capability matters.
    async fn request_display_media(&self) -> Result<MediaStream, MediaAccessError>;

    /// Play a short clip through the default output device for the
    /// speaker test. Playback success does not imply audibility; the user
    /// confirms separately.
    async fn play_clip(&self, clip: &Path) -> Result<(), MediaAccessError>;
}
