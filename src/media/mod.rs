pub mod backend;
pub mod desktop;
pub mod error;
pub mod level;
pub mod mic;
pub mod recorder;
pub mod stream;
pub mod webcam;

#[cfg(test)]
pub mod fake;

pub use backend::{MediaBackend, MediaConstraints};
pub use desktop::DesktopMediaBackend;
pub use error::MediaAccessError;
pub use level::AudioLevelMonitor;
pub use recorder::{MediaBlob, TrackRecorder};
pub use stream::{MediaChunk, MediaStream, MediaTrack, TrackKind};
