//! Tick driver shared by both control loops.
//!
//! A [`LoopRunner`] owns one [`ControlLoop`] together with its channel client
//! and inbox. Each tick:
//! 1. If the client dropped, try one reconnect (the channel replays retained
//!    values into the inbox on success)
//! 2. Drain the inbox and hand every delivery to the loop; rejected payloads
//!    are logged and leave the loop state untouched
//! 3. Advance the loop's physics by one period
//! 4. Publish telemetry when connected; otherwise skip it
//! 5. Emit the periodic status line when due
//!
//! The runner is the only writer of the loop state; transport callbacks only
//! ever touch the inbox.

use std::sync::Arc;

use hl_bus::{Inbox, Message, MessageBus, RetryPolicy, connect_with_retry};
use hl_controls::{SampleClock, SampleConfig};
use hl_core::PayloadError;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

/// What a loop did with one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    /// The message updated the loop state.
    Applied,
    /// Not a topic this loop acts on.
    Ignored,
    /// The payload did not parse; prior state kept.
    Rejected(PayloadError),
}

/// One control loop: owned state, inbound handling, a physics tick and the
/// telemetry it publishes.
pub trait ControlLoop: Send {
    /// Read-only view of the published values.
    type Snapshot: Clone + Send + 'static;

    /// Name used in logs and as the thread name.
    fn name(&self) -> &'static str;

    /// Topic filters this loop consumes.
    fn subscriptions(&self) -> Vec<String>;

    fn handle(&mut self, topic: &str, payload: &str) -> Handled;

    /// Advance the physics by `dt` seconds using the last known inputs.
    fn tick(&mut self, dt: f64);

    /// Messages to publish after a tick.
    fn telemetry(&self) -> Vec<Message>;

    fn snapshot(&self) -> Self::Snapshot;

    /// Emit one status log line.
    fn log_status(&self);
}

/// Counters kept by a runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerStats {
    pub ticks: u64,
    pub applied: u64,
    pub rejected: u64,
    pub published: u64,
    /// Ticks whose telemetry was not published.
    pub skipped_publications: u64,
    pub reconnects: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Up,
    Down,
}

pub struct LoopRunner<L: ControlLoop> {
    control: L,
    bus: Arc<dyn MessageBus>,
    inbox: Arc<Inbox>,
    dt: f64,
    elapsed_s: f64,
    status: SampleClock,
    link: Link,
    stats: RunnerStats,
}

impl<L: ControlLoop> LoopRunner<L> {
    /// # Arguments
    ///
    /// * `control` - The loop to drive
    /// * `bus` - This loop's own channel client
    /// * `dt` - Tick length in seconds
    /// * `status_interval_s` - Loop time between status lines
    pub fn new(
        control: L,
        bus: Arc<dyn MessageBus>,
        dt: f64,
        status_interval_s: f64,
    ) -> AppResult<Self> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(AppError::Validation("tick length must be positive".to_string()));
        }
        let status = SampleClock::new(SampleConfig::new(status_interval_s)?, 0.0);
        Ok(Self {
            control,
            bus,
            inbox: Arc::new(Inbox::new()),
            dt,
            elapsed_s: 0.0,
            status,
            link: Link::Down,
            stats: RunnerStats::default(),
        })
    }

    /// Connect (retrying per `policy`) and subscribe. Ticking must not begin
    /// before this returns.
    pub fn start(&mut self, policy: &RetryPolicy) -> AppResult<()> {
        connect_with_retry(self.bus.as_ref(), policy)?;
        for filter in self.control.subscriptions() {
            self.bus.subscribe(&filter, &self.inbox)?;
        }
        self.link = Link::Up;
        info!(
            loop_name = self.control.name(),
            client = self.bus.client_id(),
            "loop started"
        );
        Ok(())
    }

    /// Run one tick.
    pub fn tick(&mut self) {
        self.check_link();

        for delivery in self.inbox.drain() {
            match self.control.handle(&delivery.topic, &delivery.payload) {
                Handled::Applied => self.stats.applied += 1,
                Handled::Ignored => {
                    debug!(loop_name = self.control.name(), topic = %delivery.topic, "ignored message");
                }
                Handled::Rejected(err) => {
                    self.stats.rejected += 1;
                    warn!(
                        loop_name = self.control.name(),
                        topic = %delivery.topic,
                        payload = %delivery.payload,
                        error = %err,
                        "rejected payload, keeping previous value"
                    );
                }
            }
        }

        self.control.tick(self.dt);
        self.elapsed_s += self.dt;
        self.stats.ticks += 1;

        self.publish_telemetry();

        if self.status.poll(self.elapsed_s) {
            self.control.log_status();
        }
    }

    fn check_link(&mut self) {
        if self.bus.is_connected() {
            self.link = Link::Up;
            return;
        }
        if self.link == Link::Up {
            warn!(
                loop_name = self.control.name(),
                "channel connection lost, ticking on last known inputs"
            );
            self.link = Link::Down;
        }
        if self.bus.connect().is_ok() {
            info!(loop_name = self.control.name(), "channel connection restored");
            self.link = Link::Up;
            self.stats.reconnects += 1;
        }
    }

    fn publish_telemetry(&mut self) {
        if self.link == Link::Down {
            self.stats.skipped_publications += 1;
            return;
        }
        for message in self.control.telemetry() {
            if let Err(err) = self.bus.publish(message) {
                warn!(
                    loop_name = self.control.name(),
                    error = %err,
                    "publish failed, pausing publication"
                );
                self.link = Link::Down;
                self.stats.skipped_publications += 1;
                return;
            }
            self.stats.published += 1;
        }
    }

    pub fn control(&self) -> &L {
        &self.control
    }

    /// Mutable access for in-process callers that bypass the channel.
    pub fn control_mut(&mut self) -> &mut L {
        &mut self.control
    }

    pub fn bus(&self) -> &Arc<dyn MessageBus> {
        &self.bus
    }

    pub fn stats(&self) -> RunnerStats {
        self.stats
    }

    /// Loop time in seconds.
    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn snapshot(&self) -> L::Snapshot {
        self.control.snapshot()
    }

    pub fn is_connected(&self) -> bool {
        self.link == Link::Up
    }

    /// Disconnect from the channel.
    pub fn shutdown(&mut self) {
        self.bus.disconnect();
        self.link = Link::Down;
        info!(loop_name = self.control.name(), ticks = self.stats.ticks, "loop stopped");
    }
}
