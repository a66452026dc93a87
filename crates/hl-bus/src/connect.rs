//! Startup connection with fixed backoff.

use std::time::Duration;

use tracing::{info, warn};

use crate::bus::MessageBus;
use crate::error::{BusError, BusResult};

/// How to wait for the channel at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Fixed pause between attempts.
    pub backoff: Duration,
    /// Give up after this many attempts; `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(5),
            max_attempts: None,
        }
    }
}

/// Block until `bus` connects. Returns the number of attempts used.
pub fn connect_with_retry(bus: &dyn MessageBus, policy: &RetryPolicy) -> BusResult<u32> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match bus.connect() {
            Ok(()) => {
                info!(client = bus.client_id(), attempt, "connected to broker");
                return Ok(attempt);
            }
            Err(err) => {
                if policy.max_attempts.is_some_and(|max| attempt >= max) {
                    return Err(BusError::ConnectExhausted {
                        client: bus.client_id().to_string(),
                        attempts: attempt,
                    });
                }
                warn!(
                    client = bus.client_id(),
                    attempt,
                    error = %err,
                    "waiting for broker, retrying in {:?}",
                    policy.backoff
                );
                std::thread::sleep(policy.backoff);
            }
        }
    }
}
