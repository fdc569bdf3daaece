//! Device permission gate.
//!
//! Acquires the four capabilities the interview needs before the question
//! loop may start: camera, microphone, speaker and screen share. Camera and
//! microphone come from one combined request, the screen-share grant is
//! probed and released immediately, and the speaker check is confirmed by
//! the user rather than inferred from playback success.

use crate::media::{MediaAccessError, MediaBackend, MediaConstraints, MediaStream, TrackKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Camera,
    Microphone,
    Speaker,
    ScreenShare,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Microphone => "microphone",
            Self::Speaker => "speaker",
            Self::ScreenShare => "screen_share",
        }
    }
}

/// Readiness flags, one per capability.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CapabilityReadiness {
    pub camera: bool,
    pub microphone: bool,
    pub speaker: bool,
    pub screen_share: bool,
}

#[derive(Default)]
struct GateInner {
    readiness: CapabilityReadiness,
    /// Live camera/microphone preview stream, held until the interview
    /// starts or the request is retried.
    preview: Option<MediaStream>,
    speaker_test_started: bool,
    camera_mic_error: Option<MediaAccessError>,
    speaker_error: Option<MediaAccessError>,
    screen_share_error: Option<MediaAccessError>,
}

impl GateInner {
    fn release_preview(&mut self) {
        if let Some(preview) = self.preview.take() {
            preview.stop_all();
        }
    }
}

/// Snapshot of the gate for API status responses.
#[derive(Debug, Clone, Serialize)]
pub struct GateStatus {
    pub readiness: CapabilityReadiness,
    pub ready: bool,
    pub missing: Vec<String>,
    pub speaker_test_started: bool,
    pub camera_mic_error: Option<MediaAccessError>,
    pub speaker_error: Option<MediaAccessError>,
    pub screen_share_error: Option<MediaAccessError>,
}

#[derive(Clone)]
pub struct PermissionGate {
    backend: Arc<dyn MediaBackend>,
    require_speaker_check: bool,
    speaker_clip: PathBuf,
    inner: Arc<Mutex<GateInner>>,
}

impl PermissionGate {
    pub fn new(
        backend: Arc<dyn MediaBackend>,
        require_speaker_check: bool,
        speaker_clip: PathBuf,
    ) -> Self {
        Self {
            backend,
            require_speaker_check,
            speaker_clip,
            inner: Arc::new(Mutex::new(GateInner::default())),
        }
    }

    /// One combined camera+microphone request. Success sets both flags,
    /// since the stream implies both were granted together, and keeps the
    /// stream live as the preview. Calling again retries from scratch.
    pub async fn request_camera_mic(&self) -> Result<(), MediaAccessError> {
        {
            let mut inner = self.inner.lock().await;
            inner.release_preview();
            inner.readiness.camera = false;
            inner.readiness.microphone = false;
            inner.camera_mic_error = None;
        }

        match self
            .backend
            .request_user_media(MediaConstraints::audio_video())
            .await
        {
            Ok(stream) => {
                let mut inner = self.inner.lock().await;
                inner.readiness.camera = stream.has_kind(TrackKind::Video);
                inner.readiness.microphone = stream.has_kind(TrackKind::Audio);
                inner.preview = Some(stream);
                info!(
                    "Camera/microphone granted (camera: {}, microphone: {})",
                    inner.readiness.camera, inner.readiness.microphone
                );
                Ok(())
            }
            Err(e) => {
                warn!("Camera/microphone request failed: {}", e);
                self.inner.lock().await.camera_mic_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Probe the screen-share grant and release the tracks immediately;
    /// only the capability is needed, not the live stream.
    pub async fn request_screen_share(&self) -> Result<(), MediaAccessError> {
        {
            let mut inner = self.inner.lock().await;
            inner.readiness.screen_share = false;
            inner.screen_share_error = None;
        }

        match self.backend.request_display_media().await {
            Ok(stream) => {
                stream.stop_all();
                self.inner.lock().await.readiness.screen_share = true;
                info!("Screen share granted");
                Ok(())
            }
            Err(e) => {
                warn!("Screen share request failed: {}", e);
                self.inner.lock().await.screen_share_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Play the speaker-test clip. Playback success does not set
    /// readiness; the user confirms audibility separately.
    pub async fn start_speaker_test(&self) -> Result<(), MediaAccessError> {
        self.inner.lock().await.speaker_error = None;

        match self.backend.play_clip(&self.speaker_clip).await {
            Ok(()) => {
                self.inner.lock().await.speaker_test_started = true;
                Ok(())
            }
            Err(e) => {
                warn!("Speaker test playback failed: {}", e);
                self.inner.lock().await.speaker_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Record the user's answer to "did you hear it?".
    pub async fn confirm_speaker(&self, heard: bool) {
        let mut inner = self.inner.lock().await;
        if heard {
            inner.readiness.speaker = true;
            info!("Speaker check confirmed");
        }
    }

    pub async fn readiness(&self) -> CapabilityReadiness {
        self.inner.lock().await.readiness
    }

    /// All required capabilities granted?
    pub async fn ready(&self) -> bool {
        self.missing().await.is_empty()
    }

    /// Capabilities still blocking the interview, in a fixed order for
    /// user-visible prompts.
    pub async fn missing(&self) -> Vec<Capability> {
        let readiness = self.inner.lock().await.readiness;
        let mut missing = Vec::new();
        if !readiness.camera {
            missing.push(Capability::Camera);
        }
        if !readiness.microphone {
            missing.push(Capability::Microphone);
        }
        if self.require_speaker_check && !readiness.speaker {
            missing.push(Capability::Speaker);
        }
        if !readiness.screen_share {
            missing.push(Capability::ScreenShare);
        }
        missing
    }

    /// Stop the camera/microphone preview stream. Called when the
    /// interview starts; the recording lifecycle acquires its own stream
    /// per question.
    pub async fn release_preview(&self) {
        self.inner.lock().await.release_preview();
    }

    pub async fn status(&self) -> GateStatus {
        let missing: Vec<String> = self
            .missing()
            .await
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        let inner = self.inner.lock().await;
        GateStatus {
            readiness: inner.readiness,
            ready: missing.is_empty(),
            missing,
            speaker_test_started: inner.speaker_test_started,
            camera_mic_error: inner.camera_mic_error.clone(),
            speaker_error: inner.speaker_error.clone(),
            screen_share_error: inner.screen_share_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::fake::{FakeBackend, FakeOutcome};

    fn gate(backend: &FakeBackend, require_speaker: bool) -> PermissionGate {
        PermissionGate::new(
            Arc::new(backend.clone()),
            require_speaker,
            PathBuf::from("voices/One.mp3"),
        )
    }

    #[tokio::test]
    async fn test_combined_grant_sets_camera_and_mic() {
        let backend = FakeBackend::new();
        let gate = gate(&backend, true);

        gate.request_camera_mic().await.unwrap();
        let readiness = gate.readiness().await;
        assert!(readiness.camera);
        assert!(readiness.microphone);
        // Preview stream stays live until released
        assert!(!backend.all_issued_stopped());

        gate.release_preview().await;
        assert!(backend.all_issued_stopped());
    }

    #[tokio::test]
    async fn test_denied_camera_mic_stores_classified_reason() {
        let backend = FakeBackend::new();
        backend.script(FakeOutcome::Deny(MediaAccessError::PermissionDenied));
        let gate = gate(&backend, true);

        let err = gate.request_camera_mic().await.unwrap_err();
        assert_eq!(err, MediaAccessError::PermissionDenied);

        let status = gate.status().await;
        assert!(!status.readiness.camera);
        assert!(!status.readiness.microphone);
        assert_eq!(
            status.camera_mic_error,
            Some(MediaAccessError::PermissionDenied)
        );
    }

    #[tokio::test]
    async fn test_retry_after_denial_grants() {
        let backend = FakeBackend::new();
        backend.script(FakeOutcome::Deny(MediaAccessError::PermissionDenied));
        let gate = gate(&backend, false);

        assert!(gate.request_camera_mic().await.is_err());
        assert!(!gate.ready().await);

        // User fixed browser permissions; retry succeeds and unlocks
        gate.request_camera_mic().await.unwrap();
        gate.request_screen_share().await.unwrap();
        assert!(gate.ready().await);
        assert!(gate.status().await.camera_mic_error.is_none());
    }

    #[tokio::test]
    async fn test_audio_only_grant_leaves_camera_not_ready() {
        let backend = FakeBackend::new();
        backend.script(FakeOutcome::Grant {
            video: false,
            audio: true,
        });
        let gate = gate(&backend, false);

        gate.request_camera_mic().await.unwrap();
        let readiness = gate.readiness().await;
        assert!(!readiness.camera);
        assert!(readiness.microphone);
        assert_eq!(gate.missing().await, vec![Capability::Camera]);
    }

    #[tokio::test]
    async fn test_screen_share_releases_tracks_immediately() {
        let backend = FakeBackend::new();
        let gate = gate(&backend, false);

        gate.request_screen_share().await.unwrap();
        assert!(gate.readiness().await.screen_share);
        assert!(backend.all_issued_stopped());
    }

    #[tokio::test]
    async fn test_speaker_ready_only_after_confirmation() {
        let backend = FakeBackend::new();
        let gate = gate(&backend, true);

        gate.start_speaker_test().await.unwrap();
        assert_eq!(backend.played_clips().len(), 1);
        // Playback alone is not audibility
        assert!(!gate.readiness().await.speaker);

        gate.confirm_speaker(false).await;
        assert!(!gate.readiness().await.speaker);

        gate.confirm_speaker(true).await;
        assert!(gate.readiness().await.speaker);
    }

    #[tokio::test]
    async fn test_gate_unlocks_only_with_all_required() {
        let backend = FakeBackend::new();
        let gate = gate(&backend, true);

        gate.request_camera_mic().await.unwrap();
        gate.request_screen_share().await.unwrap();
        assert!(!gate.ready().await);
        assert_eq!(gate.missing().await, vec![Capability::Speaker]);

        gate.start_speaker_test().await.unwrap();
        gate.confirm_speaker(true).await;
        assert!(gate.ready().await);
    }

    #[tokio::test]
    async fn test_speaker_check_optional_when_configured_off() {
        let backend = FakeBackend::new();
        let gate = gate(&backend, false);

        gate.request_camera_mic().await.unwrap();
        gate.request_screen_share().await.unwrap();
        assert!(gate.ready().await);
    }
}
