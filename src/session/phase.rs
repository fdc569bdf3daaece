//! Interview session phases.

use serde::{Deserialize, Serialize};

/// Phase of the interview session state machine.
///
/// `Idle` is the constructed state; the controller moves to
/// `PermissionPending` when the permission flow begins and only leaves it
/// once every required capability is granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    PermissionPending,
    Loading,
    Recording,
    Submitting,
    Complete,
    Errored,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PermissionPending => "permissionpending",
            Self::Loading => "loading",
            Self::Recording => "recording",
            Self::Submitting => "submitting",
            Self::Complete => "complete",
            Self::Errored => "errored",
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_as_str() {
        assert_eq!(Phase::Idle.as_str(), "idle");
        assert_eq!(Phase::PermissionPending.as_str(), "permissionpending");
        assert_eq!(Phase::Loading.as_str(), "loading");
        assert_eq!(Phase::Recording.as_str(), "recording");
        assert_eq!(Phase::Submitting.as_str(), "submitting");
        assert_eq!(Phase::Complete.as_str(), "complete");
        assert_eq!(Phase::Errored.as_str(), "errored");
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&Phase::Recording).unwrap();
        assert_eq!(json, "\"recording\"");

        let parsed: Phase = serde_json::from_str("\"complete\"").unwrap();
        assert_eq!(parsed, Phase::Complete);
    }
}
