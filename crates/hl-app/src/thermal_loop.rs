//! Building thermal loop: boiler telemetry and window events in, indoor
//! climate and heating demand out.

use hl_bus::topics::{boiler, thermal, window};
use hl_bus::{Message, codec};
use hl_core::{parse_number, parse_window, round_to};
use hl_sim::{HeatBalance, ThermalInputs, ThermalModel, TickModel, WindowSet, WindowUpdate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::runner::{ControlLoop, Handled};

/// Published view of the building; also the diagnostics payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalSnapshot {
    pub indoor_temp: f64,
    pub outdoor_temp: f64,
    pub target_temp: f64,
    pub heating_demand: f64,
    pub windows_open: usize,
    pub boiler_water: f64,
    pub boiler_return: f64,
    pub heat_loss_kj: f64,
    pub heat_provided_kj: f64,
}

impl ThermalSnapshot {
    fn rounded(&self) -> Self {
        Self {
            indoor_temp: round_to(self.indoor_temp, 2),
            outdoor_temp: round_to(self.outdoor_temp, 2),
            heating_demand: round_to(self.heating_demand, 1),
            boiler_water: round_to(self.boiler_water, 1),
            boiler_return: round_to(self.boiler_return, 1),
            heat_loss_kj: round_to(self.heat_loss_kj, 3),
            heat_provided_kj: round_to(self.heat_provided_kj, 3),
            ..self.clone()
        }
    }
}

pub struct ThermalLoop {
    model: ThermalModel,
    windows: WindowSet,
    boiler_water_temp: f64,
    boiler_return_temp: f64,
    clock: Box<dyn Clock>,
    last_balance: HeatBalance,
}

impl ThermalLoop {
    pub fn new(model: ThermalModel, windows: WindowSet, clock: Box<dyn Clock>) -> Self {
        let defaults = ThermalInputs::default();
        Self {
            model,
            windows,
            boiler_water_temp: defaults.boiler_water_temp,
            boiler_return_temp: defaults.boiler_return_temp,
            clock,
            last_balance: HeatBalance {
                u_eff: 0.0,
                heat_loss_kj: 0.0,
                heat_provided_kj: 0.0,
            },
        }
    }

    pub fn model(&self) -> &ThermalModel {
        &self.model
    }

    pub fn windows(&self) -> &WindowSet {
        &self.windows
    }

    pub fn last_balance(&self) -> &HeatBalance {
        &self.last_balance
    }

    fn inputs(&self) -> ThermalInputs {
        ThermalInputs {
            boiler_water_temp: self.boiler_water_temp,
            boiler_return_temp: self.boiler_return_temp,
            windows_open_count: self.windows.open_count(),
            hour_of_day: self.clock.hour_of_day(),
        }
    }

    fn apply_window(&mut self, id: &str, payload: &str) -> Handled {
        let open = match parse_window(payload) {
            Ok(open) => open,
            Err(e) => return Handled::Rejected(e),
        };
        match self.windows.set_open(id, open) {
            WindowUpdate::Changed => {
                let room = self.windows.get(id).map(|w| w.room.as_str()).unwrap_or(id);
                info!(window = id, room, open, "window changed");
                Handled::Applied
            }
            WindowUpdate::Unchanged => Handled::Applied,
            WindowUpdate::Unknown => {
                warn!(window = id, "event for unknown window ignored");
                Handled::Ignored
            }
        }
    }

    fn apply_target(&mut self, payload: &str) -> Handled {
        let requested = match parse_number(payload) {
            Ok(v) => v,
            Err(e) => return Handled::Rejected(e),
        };
        match self.model.set_target(requested) {
            Ok(applied) => {
                info!(requested, applied, "comfort target updated");
                Handled::Applied
            }
            Err(_) => Handled::Ignored,
        }
    }
}

impl ControlLoop for ThermalLoop {
    type Snapshot = ThermalSnapshot;

    fn name(&self) -> &'static str {
        "thermal"
    }

    fn subscriptions(&self) -> Vec<String> {
        [
            boiler::WATER_TEMP,
            boiler::RETURN_TEMP,
            thermal::TARGET_COMMAND,
            window::STATE_FILTER,
        ]
        .iter()
        .map(|t| t.to_string())
        .collect()
    }

    fn handle(&mut self, topic: &str, payload: &str) -> Handled {
        if let Some(id) = window::id_from_topic(topic) {
            return self.apply_window(id, payload);
        }
        match topic {
            thermal::TARGET_COMMAND => self.apply_target(payload),
            boiler::WATER_TEMP | boiler::RETURN_TEMP => match parse_number(payload) {
                Ok(value) => {
                    if topic == boiler::WATER_TEMP {
                        self.boiler_water_temp = value;
                    } else {
                        self.boiler_return_temp = value;
                    }
                    debug!(topic, value, "boiler telemetry updated");
                    Handled::Applied
                }
                Err(e) => Handled::Rejected(e),
            },
            _ => Handled::Ignored,
        }
    }

    fn tick(&mut self, dt: f64) {
        let inputs = self.inputs();
        self.last_balance = self.model.step(&inputs, dt);
        self.clock.advance(dt);
    }

    fn telemetry(&self) -> Vec<Message> {
        let s = self.model.state();
        let mut messages = vec![
            Message::retained(thermal::INDOOR_TEMP, codec::temperature(s.indoor_temp)),
            Message::retained(thermal::OUTDOOR_TEMP, codec::temperature(s.outdoor_temp)),
            Message::retained(thermal::HEATING_DEMAND, codec::percent(s.heating_demand)),
            Message::retained(
                thermal::WINDOWS_OPEN_COUNT,
                codec::count(s.windows_open_count),
            ),
        ];
        match serde_json::to_string(&self.snapshot().rounded()) {
            Ok(json) => messages.push(Message::retained(thermal::DIAGNOSTICS, json)),
            Err(e) => debug!(error = %e, "diagnostics not serializable"),
        }
        messages
    }

    fn snapshot(&self) -> ThermalSnapshot {
        let s = self.model.state();
        ThermalSnapshot {
            indoor_temp: s.indoor_temp,
            outdoor_temp: s.outdoor_temp,
            target_temp: s.target_temp,
            heating_demand: s.heating_demand,
            windows_open: self.windows.open_count(),
            boiler_water: self.boiler_water_temp,
            boiler_return: self.boiler_return_temp,
            heat_loss_kj: self.last_balance.heat_loss_kj,
            heat_provided_kj: self.last_balance.heat_provided_kj,
        }
    }

    fn log_status(&self) {
        let s = self.model.state();
        info!(
            indoor = round_to(s.indoor_temp, 1),
            outdoor = round_to(s.outdoor_temp, 1),
            target = s.target_temp,
            demand = s.heating_demand.round(),
            windows_open = s.windows_open_count,
            "thermal status"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimulatedClock;
    use hl_core::PayloadError;
    use hl_sim::ThermalParams;

    fn thermal_loop() -> ThermalLoop {
        ThermalLoop::new(
            ThermalModel::new(ThermalParams::default(), 10.0).unwrap(),
            WindowSet::default(),
            Box::new(SimulatedClock::new(10.0)),
        )
    }

    #[test]
    fn window_events() {
        let mut l = thermal_loop();
        let kitchen = window::state_topic("kitchen");
        assert_eq!(l.handle(&kitchen, "ON"), Handled::Applied);
        assert_eq!(l.handle(&window::state_topic("bedroom"), "open"), Handled::Applied);
        assert_eq!(l.windows().open_count(), 2);
        assert!(matches!(
            l.handle(&kitchen, "ajar"),
            Handled::Rejected(PayloadError::UnknownState { .. })
        ));
        assert_eq!(l.windows().open_count(), 2);
        assert_eq!(l.handle(&kitchen, "closed"), Handled::Applied);
        assert_eq!(l.windows().open_count(), 1);
        assert_eq!(
            l.handle(&window::state_topic("attic"), "on"),
            Handled::Ignored
        );
    }

    #[test]
    fn boiler_telemetry_updates_inputs() {
        let mut l = thermal_loop();
        assert_eq!(l.handle(boiler::WATER_TEMP, "60.5"), Handled::Applied);
        assert!(matches!(l.handle(boiler::RETURN_TEMP, "n/a"), Handled::Rejected(_)));
        let snap = l.snapshot();
        assert_eq!(snap.boiler_water, 60.5);
        assert_eq!(snap.boiler_return, 35.0);
    }

    #[test]
    fn target_command_is_clamped() {
        let mut l = thermal_loop();
        assert_eq!(l.handle(thermal::TARGET_COMMAND, "21"), Handled::Applied);
        assert_eq!(l.model().state().target_temp, 21.0);
        l.handle(thermal::TARGET_COMMAND, "90");
        assert_eq!(l.model().state().target_temp, 30.0);
    }

    #[test]
    fn tick_counts_open_windows_and_publishes() {
        let mut l = thermal_loop();
        l.handle(&window::state_topic("living_room"), "on");
        l.tick(1.0);
        assert_eq!(l.model().state().windows_open_count, 1);
        assert!((l.last_balance().u_eff - 0.9).abs() < 1e-12);

        let messages = l.telemetry();
        let count = messages
            .iter()
            .find(|m| m.topic == thermal::WINDOWS_OPEN_COUNT)
            .unwrap();
        assert_eq!(count.payload, "1");
        let diag = messages
            .iter()
            .find(|m| m.topic == thermal::DIAGNOSTICS)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&diag.payload).unwrap();
        assert_eq!(value["windows_open"], 1);
        assert_eq!(value["target_temp"], 20.0);
    }
}
