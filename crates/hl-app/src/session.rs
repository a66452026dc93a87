//! Lockstep simulation session.
//!
//! Runs both loops on one thread against an in-process broker, ticking the
//! boiler then the building each step, so runs are fast and reproducible
//! (given a seed). Coupling still goes through the channel. The building sees
//! the boiler's telemetry from the same tick; the boiler sees the building's
//! one tick late.

use std::sync::Arc;

use hl_bus::{Broker, MessageBus, RetryPolicy};
use hl_sim::{BoilerModel, ThermalModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::boiler_loop::{BoilerLoop, BoilerSnapshot};
use crate::clock::SimulatedClock;
use crate::config::{Config, ScenarioEvent};
use crate::error::{AppError, AppResult};
use crate::runner::LoopRunner;
use crate::runtime::operator_message;
use crate::thermal_loop::{ThermalLoop, ThermalSnapshot};

/// State of both loops after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    pub time_s: f64,
    pub boiler: BoilerSnapshot,
    pub thermal: ThermalSnapshot,
}

pub struct Session {
    broker: Arc<Broker>,
    boiler: LoopRunner<BoilerLoop>,
    thermal: LoopRunner<ThermalLoop>,
    operator: Arc<dyn MessageBus>,
    scenario: Vec<ScenarioEvent>,
    next_event: usize,
    time_s: f64,
}

impl Session {
    pub fn new(config: &Config) -> AppResult<Self> {
        config.validate()?;
        let broker = Broker::new();
        let dt = config.tick_dt();
        // The broker is local and up; one attempt is enough.
        let policy = RetryPolicy {
            backoff: std::time::Duration::ZERO,
            max_attempts: Some(1),
        };

        let boiler_bus: Arc<dyn MessageBus> = Arc::new(broker.client("boiler"));
        let mut boiler = LoopRunner::new(
            BoilerLoop::new(BoilerModel::new(config.boiler.clone(), config.seed)?),
            boiler_bus,
            dt,
            config.status_interval_s,
        )?;
        boiler.start(&policy)?;

        let clock = SimulatedClock::new(config.start_hour);
        let thermal_bus: Arc<dyn MessageBus> = Arc::new(broker.client("thermal"));
        let mut thermal = LoopRunner::new(
            ThermalLoop::new(
                ThermalModel::new(config.thermal.clone(), config.start_hour)?,
                config.window_set()?,
                Box::new(clock),
            ),
            thermal_bus,
            dt,
            config.status_interval_s,
        )?;
        thermal.start(&policy)?;

        let operator: Arc<dyn MessageBus> = Arc::new(broker.client("operator"));
        hl_bus::connect_with_retry(operator.as_ref(), &policy)?;

        let mut scenario = config.scenario.clone();
        scenario.sort_by(|a, b| a.at_s.total_cmp(&b.at_s));

        Ok(Self {
            broker,
            boiler,
            thermal,
            operator,
            scenario,
            next_event: 0,
            time_s: 0.0,
        })
    }

    /// Publish an operator message now; loops see it on their next tick.
    pub fn inject(&self, topic: &str, payload: &str) -> AppResult<()> {
        self.ensure_operator()?;
        self.operator.publish(operator_message(topic, payload))?;
        Ok(())
    }

    fn ensure_operator(&self) -> AppResult<()> {
        if !self.operator.is_connected() {
            self.operator.connect()?;
        }
        Ok(())
    }

    /// Publish every scenario event that is due. Commands are transient, so
    /// while either loop is off the channel due events stay queued and go out
    /// in order once both loops and the operator client are back.
    fn apply_due_events(&mut self) {
        while let Some(event) = self.scenario.get(self.next_event) {
            if event.at_s > self.time_s {
                break;
            }
            let link = if self.boiler.bus().is_connected() && self.thermal.bus().is_connected() {
                self.ensure_operator()
            } else {
                Err(AppError::Bus("control loop offline".to_string()))
            };
            if let Err(e) = link {
                debug!(at_s = event.at_s, error = %e, "scenario event held until reconnect");
                break;
            }
            debug!(at_s = event.at_s, topic = %event.topic, payload = %event.payload, "scenario event");
            if let Err(e) = self
                .operator
                .publish(operator_message(&event.topic, &event.payload))
            {
                warn!(topic = %event.topic, error = %e, "scenario event not delivered");
            }
            self.next_event += 1;
        }
    }

    /// Advance both loops by one tick and return their state.
    pub fn step(&mut self) -> SessionRow {
        self.apply_due_events();
        self.boiler.tick();
        self.thermal.tick();
        self.time_s = self.boiler.elapsed_s();
        SessionRow {
            time_s: self.time_s,
            boiler: self.boiler.snapshot(),
            thermal: self.thermal.snapshot(),
        }
    }

    /// Run `ticks` ticks, collecting one row per tick.
    pub fn run(&mut self, ticks: usize) -> Vec<SessionRow> {
        let rows: Vec<SessionRow> = (0..ticks).map(|_| self.step()).collect();
        if let Some(last) = rows.last() {
            info!(
                ticks,
                time_s = last.time_s,
                indoor = last.thermal.indoor_temp,
                water = last.boiler.boiler_temp,
                "simulation finished"
            );
        }
        rows
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    pub fn boiler(&self) -> &LoopRunner<BoilerLoop> {
        &self.boiler
    }

    pub fn thermal(&self) -> &LoopRunner<ThermalLoop> {
        &self.thermal
    }

    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    /// Disconnect every client.
    pub fn shutdown(mut self) {
        self.boiler.shutdown();
        self.thermal.shutdown();
        self.operator.disconnect();
    }
}
