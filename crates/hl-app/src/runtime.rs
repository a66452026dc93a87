//! Real-time runtime: both loops on their own scheduler threads.

use std::sync::{Arc, Mutex, MutexGuard};

use hl_bus::{Broker, Message, MessageBus};
use hl_sim::{BoilerModel, ThermalModel};
use tracing::{info, warn};

use crate::boiler_loop::{BoilerLoop, BoilerSnapshot};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::runner::{ControlLoop, LoopRunner, RunnerStats};
use crate::scheduler::PeriodicTask;
use crate::thermal_loop::{ThermalLoop, ThermalSnapshot};

/// Message for an operator- or scenario-issued payload. Commands (`.../set`)
/// are transient; state topics are retained.
pub fn operator_message(topic: &str, payload: &str) -> Message {
    if topic.ends_with("/set") {
        Message::transient(topic, payload)
    } else {
        Message::retained(topic, payload)
    }
}

struct Shared<L: ControlLoop> {
    snapshot: L::Snapshot,
    stats: RunnerStats,
}

/// A loop running on its own thread, with its latest snapshot.
pub struct LoopHandle<L: ControlLoop> {
    task: PeriodicTask,
    shared: Arc<Mutex<Shared<L>>>,
    bus: Arc<dyn MessageBus>,
}

impl<L: ControlLoop + 'static> LoopHandle<L> {
    fn spawn(mut runner: LoopRunner<L>, config: &Config) -> AppResult<Self> {
        runner.start(&config.retry_policy())?;
        let shared = Arc::new(Mutex::new(Shared::<L> {
            snapshot: runner.snapshot(),
            stats: runner.stats(),
        }));
        let bus = Arc::clone(runner.bus());
        let name = runner.control().name();
        let writer = Arc::clone(&shared);
        let task = PeriodicTask::spawn(name, config.tick_period(), move || {
            runner.tick();
            let mut shared = lock(&writer);
            shared.snapshot = runner.snapshot();
            shared.stats = runner.stats();
        })?;
        Ok(Self { task, shared, bus })
    }

    pub fn snapshot(&self) -> L::Snapshot {
        lock(&self.shared).snapshot.clone()
    }

    pub fn stats(&self) -> RunnerStats {
        lock(&self.shared).stats
    }

    fn stop(self) -> AppResult<()> {
        let name = self.task.name().to_string();
        self.task.stop()?;
        self.bus.disconnect();
        info!(loop_name = %name, "loop stopped");
        Ok(())
    }
}

/// Stop a loop that already started when a later one failed to. The startup
/// error is the one reported.
fn abort_start<L: ControlLoop + 'static>(started: LoopHandle<L>, err: AppError) -> AppError {
    if let Err(stop) = started.stop() {
        warn!(error = %stop, "loop did not stop cleanly after failed startup");
    }
    err
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Both loops plus an operator client for injected commands.
pub struct Runtime {
    broker: Arc<Broker>,
    boiler: LoopHandle<BoilerLoop>,
    thermal: LoopHandle<ThermalLoop>,
    operator: Arc<dyn MessageBus>,
}

impl Runtime {
    /// Build both loops from `config`, connect them to `broker` and start
    /// ticking. The thermal loop follows the local wall clock.
    pub fn start(config: &Config, broker: Arc<Broker>) -> AppResult<Self> {
        Self::start_with_clock(config, broker, Box::new(SystemClock))
    }

    pub fn start_with_clock(
        config: &Config,
        broker: Arc<Broker>,
        clock: Box<dyn Clock>,
    ) -> AppResult<Self> {
        config.validate()?;
        let dt = config.tick_dt();

        let boiler_model = BoilerModel::new(config.boiler.clone(), config.seed)?;
        let boiler_bus: Arc<dyn MessageBus> = Arc::new(broker.client("boiler"));
        let boiler_runner = LoopRunner::new(
            BoilerLoop::new(boiler_model),
            boiler_bus,
            dt,
            config.status_interval_s,
        )?;

        let thermal_model = ThermalModel::new(config.thermal.clone(), clock.hour_of_day())?;
        let thermal_bus: Arc<dyn MessageBus> = Arc::new(broker.client("thermal"));
        let thermal_runner = LoopRunner::new(
            ThermalLoop::new(thermal_model, config.window_set()?, clock),
            thermal_bus,
            dt,
            config.status_interval_s,
        )?;

        let boiler = LoopHandle::spawn(boiler_runner, config)?;
        let thermal = match LoopHandle::spawn(thermal_runner, config) {
            Ok(handle) => handle,
            Err(e) => return Err(abort_start(boiler, e)),
        };

        let operator: Arc<dyn MessageBus> = Arc::new(broker.client("operator"));
        hl_bus::connect_with_retry(operator.as_ref(), &config.retry_policy())?;

        info!(tick_ms = config.tick_period_ms, "runtime started");
        Ok(Self {
            broker,
            boiler,
            thermal,
            operator,
        })
    }

    /// Publish an operator message (command or window state).
    pub fn inject(&self, topic: &str, payload: &str) -> AppResult<()> {
        if !self.operator.is_connected() {
            self.operator.connect()?;
        }
        self.operator.publish(operator_message(topic, payload))?;
        Ok(())
    }

    pub fn boiler(&self) -> BoilerSnapshot {
        self.boiler.snapshot()
    }

    pub fn thermal(&self) -> ThermalSnapshot {
        self.thermal.snapshot()
    }

    pub fn boiler_stats(&self) -> RunnerStats {
        self.boiler.stats()
    }

    pub fn thermal_stats(&self) -> RunnerStats {
        self.thermal.stats()
    }

    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    /// Stop both loops, join their threads and disconnect every client.
    pub fn shutdown(self) -> AppResult<()> {
        let boiler = self.boiler.stop();
        let thermal = self.thermal.stop();
        self.operator.disconnect();
        info!("runtime stopped");
        boiler.and(thermal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl_sim::BoilerParams;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn failed_start_reports_startup_error_over_stop_error() {
        let broker = Broker::new();
        let control = BoilerLoop::new(BoilerModel::new(BoilerParams::default(), Some(1)).unwrap());
        let shared = Arc::new(Mutex::new(Shared::<BoilerLoop> {
            snapshot: control.snapshot(),
            stats: RunnerStats::default(),
        }));
        let task =
            PeriodicTask::spawn("boiler", Duration::from_millis(1), || panic!("tick failed")).unwrap();
        thread::sleep(Duration::from_millis(20));
        let started = LoopHandle::<BoilerLoop> {
            task,
            shared,
            bus: Arc::new(broker.client("boiler")),
        };

        let err = abort_start(started, AppError::Bus("thermal client unavailable".to_string()));
        assert!(matches!(err, AppError::Bus(message) if message == "thermal client unavailable"));
    }
}
