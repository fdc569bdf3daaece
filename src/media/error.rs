//! Classified media-access failures.
//!
//! Device and permission failures come back from platform layers as error
//! names plus free-form detail. They are classified here once so every
//! consumer (gate, recording lifecycle, API responses) shows the same
//! human-readable reason.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum MediaAccessError {
    #[error("Camera or microphone permission was denied")]
    PermissionDenied,

    #[error("No camera or microphone found on this device")]
    DeviceNotFound,

    #[error("The device is already in use by another application")]
    DeviceBusy,

    #[error("No camera or microphone meets the specified constraints")]
    ConstraintsUnsatisfiable,

    #[error("Device access was aborted")]
    Aborted,

    #[error("Security error accessing the device")]
    SecurityError,

    #[error("Unexpected access error: {0}")]
    Unknown(String),
}

impl MediaAccessError {
    /// Classify a platform error by its name, falling back to the raw
    /// message when the name is not recognized.
    pub fn classify(name: &str, detail: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => Self::PermissionDenied,
            "NotFoundError" | "DevicesNotFoundError" => Self::DeviceNotFound,
            "NotReadableError" | "TrackStartError" => Self::DeviceBusy,
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => {
                Self::ConstraintsUnsatisfiable
            }
            "AbortError" => Self::Aborted,
            "SecurityError" => Self::SecurityError,
            _ => Self::Unknown(detail.to_string()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::DeviceNotFound => "device_not_found",
            Self::DeviceBusy => "device_busy",
            Self::ConstraintsUnsatisfiable => "constraints_unsatisfiable",
            Self::Aborted => "aborted",
            Self::SecurityError => "security_error",
            Self::Unknown(_) => "unknown",
        }
    }
}
