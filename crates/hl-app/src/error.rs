//! Error types for the hl-app service layer.

use std::path::PathBuf;

/// Application error type wrapping the lower crates' errors for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    #[error("Config validation failed: {0}")]
    Validation(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Bus error: {0}")]
    Bus(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Worker thread {name} panicked")]
    WorkerPanicked { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hl-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<hl_sim::SimError> for AppError {
    fn from(err: hl_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<hl_bus::BusError> for AppError {
    fn from(err: hl_bus::BusError) -> Self {
        AppError::Bus(err.to_string())
    }
}

impl From<hl_controls::ControlError> for AppError {
    fn from(err: hl_controls::ControlError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Export(err.to_string())
    }
}
