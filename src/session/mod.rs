pub mod controller;
pub mod gate;
pub mod phase;
pub mod recording;
pub mod status;
pub mod timer;

pub use controller::{ControllerHandle, InterviewController, SessionCommand};
pub use gate::{Capability, CapabilityReadiness, PermissionGate};
pub use phase::Phase;
pub use recording::{Recording, RecordingSession};
pub use status::{AudioLevelHandle, SessionState, SessionStatusHandle};
pub use timer::{CountdownTimer, TimerEvent};
