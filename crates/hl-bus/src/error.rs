//! Error types for bus operations.

use thiserror::Error;

pub type BusResult<T> = Result<T, BusError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("Client {client} is not connected")]
    NotConnected { client: String },

    #[error("Broker unavailable for client {client}")]
    Unavailable { client: String },

    #[error("Gave up connecting client {client} after {attempts} attempts")]
    ConnectExhausted { client: String, attempts: u32 },

    #[error("Invalid topic {topic:?}: {reason}")]
    InvalidTopic { topic: String, reason: &'static str },
}
