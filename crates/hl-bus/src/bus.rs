//! The publish/subscribe seam between the control loops and the transport.

use std::sync::Arc;

use crate::error::BusResult;
use crate::inbox::Inbox;

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: String,
    /// Retained messages are replayed to subscribers that arrive later.
    pub retain: bool,
}

impl Message {
    /// A retained state message (the common case for telemetry).
    pub fn retained(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retain: true,
        }
    }

    /// A transient message, delivered only to current subscribers.
    pub fn transient(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retain: false,
        }
    }
}

/// A connection to the state exchange channel.
///
/// Implementations must be usable from several threads: transport callbacks
/// deliver into inboxes while the owning loop publishes from its own thread.
pub trait MessageBus: Send + Sync {
    /// Name used in logs.
    fn client_id(&self) -> &str;

    /// Attempt a single connection.
    fn connect(&self) -> BusResult<()>;

    /// Drop the connection. Subscriptions are kept and replayed on reconnect.
    fn disconnect(&self);

    fn is_connected(&self) -> bool;

    /// Fire-and-forget publication.
    fn publish(&self, message: Message) -> BusResult<()>;

    /// Route every topic matching `filter` into `inbox`. Retained values that
    /// match are delivered immediately.
    fn subscribe(&self, filter: &str, inbox: &Arc<Inbox>) -> BusResult<()>;

    /// Latest retained value for a topic, if any.
    fn latest(&self, topic: &str) -> Option<String>;
}
