pub mod feedback;
pub mod permissions;
pub mod session;

use crate::feedback::FeedbackCollector;
use crate::questions::QuestionSet;
use crate::session::{AudioLevelHandle, ControllerHandle, PermissionGate, SessionStatusHandle};

/// State shared by every route handler.
#[derive(Clone)]
pub struct ApiState {
    pub controller: ControllerHandle,
    pub status: SessionStatusHandle,
    pub gate: PermissionGate,
    pub level: AudioLevelHandle,
    pub feedback: FeedbackCollector,
    pub questions: QuestionSet,
}
