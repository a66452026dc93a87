//! Boiler control loop: commands in, boiler telemetry out.

use hl_bus::topics::{boiler, thermal};
use hl_bus::{Message, codec};
use hl_core::{parse_number, parse_switch, round_to};
use hl_sim::{BoilerInputs, BoilerModel, BoilerStepReport, TickModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::runner::{ControlLoop, Handled};

/// Published view of the boiler; also the diagnostics payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoilerSnapshot {
    pub boiler_temp: f64,
    pub return_temp: f64,
    pub setpoint: f64,
    pub climate_setpoint: f64,
    pub modulation: f64,
    pub target_modulation: f64,
    pub flame: bool,
    pub enabled: bool,
    pub pressure: f64,
    pub outdoor_temp: f64,
    pub indoor_temp: f64,
    pub heating_demand: f64,
}

impl BoilerSnapshot {
    fn rounded(&self) -> Self {
        Self {
            boiler_temp: round_to(self.boiler_temp, 2),
            return_temp: round_to(self.return_temp, 2),
            setpoint: round_to(self.setpoint, 1),
            climate_setpoint: round_to(self.climate_setpoint, 1),
            modulation: round_to(self.modulation, 1),
            target_modulation: round_to(self.target_modulation, 1),
            outdoor_temp: round_to(self.outdoor_temp, 1),
            indoor_temp: round_to(self.indoor_temp, 1),
            heating_demand: round_to(self.heating_demand, 1),
            ..self.clone()
        }
    }
}

pub struct BoilerLoop {
    model: BoilerModel,
    inputs: BoilerInputs,
    last_report: Option<BoilerStepReport>,
}

impl BoilerLoop {
    pub fn new(model: BoilerModel) -> Self {
        Self {
            model,
            inputs: BoilerInputs::default(),
            last_report: None,
        }
    }

    pub fn model(&self) -> &BoilerModel {
        &self.model
    }

    pub fn inputs(&self) -> &BoilerInputs {
        &self.inputs
    }

    fn apply_setpoint(&mut self, payload: &str) -> Handled {
        let requested = match parse_number(payload) {
            Ok(v) => v,
            Err(e) => return Handled::Rejected(e),
        };
        match self.model.set_setpoint(requested) {
            Ok(applied) => {
                info!(requested, applied, "setpoint updated");
                Handled::Applied
            }
            // parse_number already rejects non-finite values
            Err(_) => Handled::Ignored,
        }
    }

    fn apply_mode(&mut self, payload: &str) -> Handled {
        match parse_switch(payload) {
            Ok(switch) => {
                let enabled = switch.is_on();
                if enabled != self.model.state().enabled {
                    info!(mode = %codec::mode(enabled), "boiler mode changed");
                }
                self.model.set_enabled(enabled);
                Handled::Applied
            }
            Err(e) => Handled::Rejected(e),
        }
    }

    fn apply_input(&mut self, topic: &str, payload: &str) -> Handled {
        let value = match parse_number(payload) {
            Ok(v) => v,
            Err(e) => return Handled::Rejected(e),
        };
        match topic {
            thermal::HEATING_DEMAND => self.inputs.heating_demand = value,
            thermal::OUTDOOR_TEMP => self.inputs.outdoor_temp = value,
            thermal::INDOOR_TEMP => self.inputs.indoor_temp = value,
            _ => return Handled::Ignored,
        }
        debug!(topic, value, "input updated");
        Handled::Applied
    }
}

impl ControlLoop for BoilerLoop {
    type Snapshot = BoilerSnapshot;

    fn name(&self) -> &'static str {
        "boiler"
    }

    fn subscriptions(&self) -> Vec<String> {
        [
            boiler::MODE_COMMAND,
            boiler::SETPOINT_COMMAND,
            thermal::HEATING_DEMAND,
            thermal::OUTDOOR_TEMP,
            thermal::INDOOR_TEMP,
        ]
        .iter()
        .map(|t| t.to_string())
        .collect()
    }

    fn handle(&mut self, topic: &str, payload: &str) -> Handled {
        match topic {
            boiler::SETPOINT_COMMAND => self.apply_setpoint(payload),
            boiler::MODE_COMMAND => self.apply_mode(payload),
            _ => self.apply_input(topic, payload),
        }
    }

    fn tick(&mut self, dt: f64) {
        let report = self.model.step(&self.inputs, dt);
        self.last_report = Some(report);
    }

    fn telemetry(&self) -> Vec<Message> {
        let s = self.model.state();
        let mut messages = vec![
            Message::retained(boiler::WATER_TEMP, codec::temperature(s.water_temp)),
            Message::retained(boiler::RETURN_TEMP, codec::temperature(s.return_temp)),
            Message::retained(boiler::MODULATION, codec::percent(s.modulation)),
            Message::retained(boiler::PRESSURE, codec::pressure(s.pressure)),
            Message::retained(boiler::FLAME, codec::flame(s.flame_on)),
            Message::retained(boiler::MODE_STATE, codec::mode(s.enabled)),
            Message::retained(boiler::SETPOINT_STATE, codec::temperature(s.setpoint)),
        ];
        match serde_json::to_string(&self.snapshot().rounded()) {
            Ok(json) => messages.push(Message::retained(boiler::DIAGNOSTICS, json)),
            Err(e) => debug!(error = %e, "diagnostics not serializable"),
        }
        messages
    }

    fn snapshot(&self) -> BoilerSnapshot {
        let s = self.model.state();
        let (target_modulation, climate_setpoint) = match &self.last_report {
            Some(r) => (r.target_modulation, r.climate_setpoint),
            None => (
                self.model.target_modulation(&self.inputs),
                self.model.params().climate.setpoint(self.inputs.outdoor_temp),
            ),
        };
        BoilerSnapshot {
            boiler_temp: s.water_temp,
            return_temp: s.return_temp,
            setpoint: s.setpoint,
            climate_setpoint,
            modulation: s.modulation,
            target_modulation,
            flame: s.flame_on,
            enabled: s.enabled,
            pressure: s.pressure,
            outdoor_temp: self.inputs.outdoor_temp,
            indoor_temp: self.inputs.indoor_temp,
            heating_demand: self.inputs.heating_demand,
        }
    }

    fn log_status(&self) {
        let s = self.model.state();
        info!(
            water = round_to(s.water_temp, 1),
            setpoint = round_to(s.setpoint, 1),
            modulation = s.modulation.round(),
            flame = s.flame_on,
            demand = self.inputs.heating_demand.round(),
            "boiler status"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl_core::PayloadError;
    use hl_sim::BoilerParams;

    fn boiler_loop() -> BoilerLoop {
        BoilerLoop::new(BoilerModel::new(BoilerParams::default(), Some(3)).unwrap())
    }

    #[test]
    fn setpoint_command() {
        let mut l = boiler_loop();
        assert_eq!(l.handle(boiler::SETPOINT_COMMAND, "52.5"), Handled::Applied);
        assert_eq!(l.model().state().setpoint, 52.5);
        assert_eq!(l.handle(boiler::SETPOINT_COMMAND, "150"), Handled::Applied);
        assert_eq!(l.model().state().setpoint, 80.0);
    }

    #[test]
    fn malformed_setpoint_keeps_previous_value() {
        let mut l = boiler_loop();
        let handled = l.handle(boiler::SETPOINT_COMMAND, "abc");
        assert!(matches!(
            handled,
            Handled::Rejected(PayloadError::NotNumeric { .. })
        ));
        assert_eq!(l.model().state().setpoint, 45.0);
    }

    #[test]
    fn mode_aliases() {
        let mut l = boiler_loop();
        for off in ["off", "OFF", " Standby ", "0", "false", "disabled"] {
            l.handle(boiler::MODE_COMMAND, "heat");
            assert!(l.model().state().enabled);
            assert_eq!(l.handle(boiler::MODE_COMMAND, off), Handled::Applied);
            assert!(!l.model().state().enabled, "{off} should switch off");
        }
        assert!(matches!(
            l.handle(boiler::MODE_COMMAND, "  "),
            Handled::Rejected(PayloadError::Empty)
        ));
        assert!(!l.model().state().enabled);
    }

    #[test]
    fn demand_input() {
        let mut l = boiler_loop();
        assert_eq!(l.handle(thermal::HEATING_DEMAND, "40"), Handled::Applied);
        assert_eq!(l.inputs().heating_demand, 40.0);
        assert!(matches!(
            l.handle(thermal::HEATING_DEMAND, "lots"),
            Handled::Rejected(_)
        ));
        assert_eq!(l.inputs().heating_demand, 40.0);
        assert_eq!(l.handle("otgw/unrelated", "1"), Handled::Ignored);
    }

    #[test]
    fn telemetry_encodings() {
        let mut l = boiler_loop();
        l.tick(1.0);
        let messages = l.telemetry();
        let get = |topic: &str| {
            messages
                .iter()
                .find(|m| m.topic == topic)
                .map(|m| m.payload.clone())
                .unwrap()
        };
        assert_eq!(get(boiler::MODULATION), "2");
        assert_eq!(get(boiler::FLAME), "OFF");
        assert_eq!(get(boiler::MODE_STATE), "heat");
        assert_eq!(get(boiler::SETPOINT_STATE), "45.0");
        assert!(messages.iter().all(|m| m.retain));

        let diag: serde_json::Value = serde_json::from_str(&get(boiler::DIAGNOSTICS)).unwrap();
        assert_eq!(diag["target_modulation"], 45.0);
        assert_eq!(diag["climate_setpoint"], 50.0);
        assert_eq!(diag["flame"], false);
        assert_eq!(diag["enabled"], true);
    }
}
