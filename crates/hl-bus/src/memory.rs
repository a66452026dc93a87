//! In-process retained broker.
//!
//! [`Broker`] keeps the retained value of every topic and the subscription
//! table; each participant talks to it through its own [`BrokerClient`],
//! which carries an independent connection state. Taking the broker offline
//! disconnects every client, which is how transport faults are exercised.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, trace};

use crate::bus::{Message, MessageBus};
use crate::error::{BusError, BusResult};
use crate::inbox::Inbox;
use crate::topics::{TopicFilter, validate_topic};

struct Subscription {
    client_id: u64,
    filter: TopicFilter,
    inbox: Arc<Inbox>,
    connected: Arc<AtomicBool>,
}

#[derive(Default)]
struct BrokerState {
    retained: BTreeMap<String, String>,
    subscriptions: Vec<Subscription>,
    clients: Vec<Arc<AtomicBool>>,
}

/// Shared retained-message broker.
pub struct Broker {
    state: Mutex<BrokerState>,
    available: AtomicBool,
    next_client: AtomicU64,
}

impl Default for Broker {
    fn default() -> Self {
        Self {
            state: Mutex::new(BrokerState::default()),
            available: AtomicBool::new(true),
            next_client: AtomicU64::new(1),
        }
    }
}

impl Broker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a new, disconnected client.
    pub fn client(self: &Arc<Self>, name: impl Into<String>) -> BrokerClient {
        let connected = Arc::new(AtomicBool::new(false));
        self.state().clients.push(Arc::clone(&connected));
        BrokerClient {
            id: self.next_client.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            broker: Arc::clone(self),
            connected,
            refuse_connects: AtomicU32::new(0),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Bring the broker up or down. Going down disconnects every client.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        if !available {
            for connected in &self.state().clients {
                connected.store(false, Ordering::SeqCst);
            }
            debug!("broker went offline");
        } else {
            debug!("broker back online");
        }
    }

    /// Latest retained payload for `topic`.
    pub fn retained(&self, topic: &str) -> Option<String> {
        self.state().retained.get(topic).cloned()
    }

    /// Number of retained topics.
    pub fn retained_count(&self) -> usize {
        self.state().retained.len()
    }

    fn route(&self, message: &Message) {
        let mut state = self.state();
        if message.retain {
            if message.payload.is_empty() {
                state.retained.remove(&message.topic);
            } else {
                state
                    .retained
                    .insert(message.topic.clone(), message.payload.clone());
            }
        }
        for sub in &state.subscriptions {
            if sub.connected.load(Ordering::SeqCst) && sub.filter.matches(&message.topic) {
                sub.inbox.deliver(&message.topic, &message.payload);
            }
        }
    }

    fn add_subscription(&self, sub: Subscription) {
        let mut state = self.state();
        for (topic, payload) in &state.retained {
            if sub.filter.matches(topic) {
                sub.inbox.deliver(topic, payload);
            }
        }
        state.subscriptions.push(sub);
    }

    fn replay_retained(&self, client_id: u64) {
        let state = self.state();
        for sub in state.subscriptions.iter().filter(|s| s.client_id == client_id) {
            for (topic, payload) in &state.retained {
                if sub.filter.matches(topic) {
                    sub.inbox.deliver(topic, payload);
                }
            }
        }
    }
}

/// One participant's connection to a [`Broker`].
pub struct BrokerClient {
    id: u64,
    name: String,
    broker: Arc<Broker>,
    connected: Arc<AtomicBool>,
    refuse_connects: AtomicU32,
}

impl BrokerClient {
    /// Make the next `n` connection attempts fail, as if the broker were
    /// still starting up.
    pub fn refuse_next_connects(&self, n: u32) {
        self.refuse_connects.store(n, Ordering::SeqCst);
    }

    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }
}

impl MessageBus for BrokerClient {
    fn client_id(&self) -> &str {
        &self.name
    }

    fn connect(&self) -> BusResult<()> {
        let refused = self
            .refuse_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused || !self.broker.is_available() {
            return Err(BusError::Unavailable {
                client: self.name.clone(),
            });
        }
        let was_connected = self.connected.swap(true, Ordering::SeqCst);
        if !was_connected {
            self.broker.replay_retained(self.id);
            debug!(client = %self.name, "connected");
        }
        Ok(())
    }

    fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            debug!(client = %self.name, "disconnected");
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn publish(&self, message: Message) -> BusResult<()> {
        if !self.is_connected() {
            return Err(BusError::NotConnected {
                client: self.name.clone(),
            });
        }
        validate_topic(&message.topic)?;
        trace!(client = %self.name, topic = %message.topic, payload = %message.payload, "publish");
        self.broker.route(&message);
        Ok(())
    }

    fn subscribe(&self, filter: &str, inbox: &Arc<Inbox>) -> BusResult<()> {
        if !self.is_connected() {
            return Err(BusError::NotConnected {
                client: self.name.clone(),
            });
        }
        let filter = TopicFilter::parse(filter)?;
        debug!(client = %self.name, filter = %filter.as_str(), "subscribe");
        self.broker.add_subscription(Subscription {
            client_id: self.id,
            filter,
            inbox: Arc::clone(inbox),
            connected: Arc::clone(&self.connected),
        });
        Ok(())
    }

    fn latest(&self, topic: &str) -> Option<String> {
        self.broker.retained(topic)
    }
}
