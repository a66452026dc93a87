//! Latest-value inbox.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// A message taken out of an [`Inbox`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub topic: String,
    pub payload: String,
}

/// Thread-safe mailbox holding the latest undelivered payload per topic.
///
/// Transport callbacks write; the owning loop drains at tick boundaries. A
/// newer payload for a topic replaces an older one that was never drained.
#[derive(Debug, Default)]
pub struct Inbox {
    pending: Mutex<BTreeMap<String, String>>,
    superseded: AtomicU64,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // Values are plain strings; a panic mid-insert cannot corrupt them.
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn deliver(&self, topic: &str, payload: &str) {
        let previous = self.pending().insert(topic.to_string(), payload.to_string());
        if previous.is_some() {
            self.superseded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Take every pending message, ordered by topic.
    pub fn drain(&self) -> Vec<Delivery> {
        let pending = std::mem::take(&mut *self.pending());
        pending
            .into_iter()
            .map(|(topic, payload)| Delivery { topic, payload })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of payloads overwritten before they were drained.
    pub fn superseded(&self) -> u64 {
        self.superseded.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_value_wins() {
        let inbox = Inbox::new();
        inbox.deliver("otgw/setpoint/set", "50");
        inbox.deliver("otgw/setpoint/set", "55");
        inbox.deliver("otgw/mode/set", "off");

        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox.superseded(), 1);

        let drained = inbox.drain();
        assert_eq!(
            drained,
            vec![
                Delivery {
                    topic: "otgw/mode/set".to_string(),
                    payload: "off".to_string()
                },
                Delivery {
                    topic: "otgw/setpoint/set".to_string(),
                    payload: "55".to_string()
                },
            ]
        );
        assert!(inbox.is_empty());
    }

    #[test]
    fn drain_on_empty_inbox() {
        let inbox = Inbox::new();
        assert!(inbox.drain().is_empty());
        assert_eq!(inbox.superseded(), 0);
    }
}
