//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered while building or driving the physical models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid parameter {field}: {reason}")]
    InvalidParam {
        field: &'static str,
        reason: &'static str,
    },

    #[error("Duplicate window id: {id}")]
    DuplicateWindow { id: String },

    #[error("Control error: {message}")]
    Control { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<hl_controls::ControlError> for SimError {
    fn from(e: hl_controls::ControlError) -> Self {
        SimError::Control {
            message: e.to_string(),
        }
    }
}

impl From<hl_core::CoreError> for SimError {
    fn from(e: hl_core::CoreError) -> Self {
        match e {
            hl_core::CoreError::NonFinite { what, .. } => SimError::InvalidArg { what },
            hl_core::CoreError::InvalidArg { what } => SimError::InvalidArg { what },
            hl_core::CoreError::InvalidRange { what, .. } => SimError::InvalidParam {
                field: what,
                reason: "range is empty or not finite",
            },
        }
    }
}
