//! Live media streams and their tracks.
//!
//! A `MediaStream` is what a capture backend hands out: a set of tracks,
//! each delivering encoded chunks over a channel while live. Stopping a
//! track is idempotent and observable by the capture side, which exits its
//! delivery loop once the flag is set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// One time-sliced fragment of encoded media.
pub type MediaChunk = Vec<u8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

pub struct MediaTrack {
    kind: TrackKind,
    label: String,
    /// Content type of the chunks this track delivers.
    mime: String,
    stopped: Arc<AtomicBool>,
    chunks: Option<mpsc::UnboundedReceiver<MediaChunk>>,
}

impl MediaTrack {
    pub fn new(
        kind: TrackKind,
        label: impl Into<String>,
        mime: impl Into<String>,
        stopped: Arc<AtomicBool>,
        chunks: mpsc::UnboundedReceiver<MediaChunk>,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            mime: mime.into(),
            stopped,
            chunks: Some(chunks),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Stop the track. Safe to call repeatedly; the capture side observes
    /// the flag and ends chunk delivery.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Hand the chunk channel to a recorder. Yields `None` once taken.
    pub fn take_chunks(&mut self) -> Option<mpsc::UnboundedReceiver<MediaChunk>> {
        self.chunks.take()
    }
}

impl Drop for MediaTrack {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct MediaStream {
    tracks: Vec<MediaTrack>,
    /// Live amplitude tap fed by the capture side, 0-255.
    level: Option<watch::Receiver<u8>>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self {
            tracks,
            level: None,
        }
    }

    pub fn with_level(mut self, level: watch::Receiver<u8>) -> Self {
        self.level = Some(level);
        self
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> &mut [MediaTrack] {
        &mut self.tracks
    }

    pub fn has_kind(&self, kind: TrackKind) -> bool {
        self.tracks.iter().any(|t| t.kind() == kind)
    }

    pub fn track_mut(&mut self, kind: TrackKind) -> Option<&mut MediaTrack> {
        self.tracks.iter_mut().find(|t| t.kind() == kind)
    }

    pub fn level_tap(&self) -> Option<watch::Receiver<u8>> {
        self.level.clone()
    }

    /// Stop every track. Idempotent.
    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    pub fn all_stopped(&self) -> bool {
        self.tracks.iter().all(|t| t.is_stopped())
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(kind: TrackKind) -> (MediaTrack, mpsc::UnboundedSender<MediaChunk>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stopped = Arc::new(AtomicBool::new(false));
        (
            MediaTrack::new(kind, "test", "application/octet-stream", stopped, rx),
            tx,
        )
    }

    #[test]
    fn test_stop_is_idempotent_and_observable() {
        let (t, _tx) = track(TrackKind::Audio);
        assert!(!t.is_stopped());
        t.stop();
        t.stop();
        assert!(t.is_stopped());
    }

    #[test]
    fn test_stop_all_stops_every_track() {
        let (video, _vtx) = track(TrackKind::Video);
        let (audio, _atx) = track(TrackKind::Audio);
        let stream = MediaStream::new(vec![video, audio]);

        assert!(!stream.all_stopped());
        stream.stop_all();
        assert!(stream.all_stopped());
    }

    #[test]
    fn test_take_chunks_only_once() {
        let (mut t, _tx) = track(TrackKind::Video);
        assert!(t.take_chunks().is_some());
        assert!(t.take_chunks().is_none());
    }

    #[test]
    fn test_has_kind() {
        let (audio, _tx) = track(TrackKind::Audio);
        let stream = MediaStream::new(vec![audio]);
        assert!(stream.has_kind(TrackKind::Audio));
        assert!(!stream.has_kind(TrackKind::Video));
    }
}
