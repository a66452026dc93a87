//! State exchange channel for hydroloop.
//!
//! A retained, latest-value publish/subscribe transport in the style of an
//! MQTT broker:
//! - Topics are `/`-separated strings; filters accept `+` and trailing `#`
//! - Retained values are delivered to new subscribers immediately
//! - Subscribers receive into an [`Inbox`] that keeps only the latest payload
//!   per topic; loops drain it at tick boundaries
//! - Delivery is fire-and-forget; there is no acknowledgment or ordering
//!   across topics
//!
//! The [`MessageBus`] trait is the seam the control loops depend on;
//! [`Broker`]/[`BrokerClient`] is the in-process implementation.

pub mod bus;
pub mod codec;
pub mod connect;
pub mod error;
pub mod inbox;
pub mod memory;
pub mod topics;

pub use bus::{Message, MessageBus};
pub use connect::{RetryPolicy, connect_with_retry};
pub use error::{BusError, BusResult};
pub use inbox::{Delivery, Inbox};
pub use memory::{Broker, BrokerClient};
pub use topics::{TopicFilter, validate_topic};
