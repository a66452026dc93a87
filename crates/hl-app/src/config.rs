//! Configuration loading and validation.
//!
//! Every field is defaulted, so an empty document (or no file at all) yields
//! the stock house: four closed windows, a 1 s tick and the physical
//! constants of [`BoilerParams`] and [`ThermalParams`].

use std::path::Path;
use std::time::Duration;

use hl_bus::RetryPolicy;
use hl_sim::{BoilerParams, ThermalParams, WindowSet, WindowState, default_windows};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Channel connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Pause between connection attempts at startup.
    pub connect_backoff_ms: u64,
    /// Give up after this many attempts; absent retries forever.
    pub max_connect_attempts: Option<u32>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            connect_backoff_ms: 5000,
            max_connect_attempts: None,
        }
    }
}

/// A scripted message published during a simulation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEvent {
    /// Loop time (seconds) at which the message is published.
    pub at_s: f64,
    pub topic: String,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tick period of both loops.
    pub tick_period_ms: u64,
    /// Loop time between status log lines.
    pub status_interval_s: f64,
    /// Pressure noise seed; absent seeds from the OS.
    pub seed: Option<u64>,
    /// Hour of day at which simulated clocks start.
    pub start_hour: f64,
    pub bus: BusConfig,
    pub boiler: BoilerParams,
    pub thermal: ThermalParams,
    pub windows: Vec<WindowState>,
    pub scenario: Vec<ScenarioEvent>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_period_ms: 1000,
            status_interval_s: 10.0,
            seed: None,
            start_hour: 0.0,
            bus: BusConfig::default(),
            boiler: BoilerParams::default(),
            thermal: ThermalParams::default(),
            windows: default_windows(),
            scenario: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        // An empty document deserializes as unit, not as an empty map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| AppError::ConfigParse(format!("Failed to parse config YAML: {}", e)))
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| AppError::ConfigParse(format!("Failed to serialize config: {}", e)))
    }

    /// Tick length in seconds.
    pub fn tick_dt(&self) -> f64 {
        self.tick_period_ms as f64 / 1000.0
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            backoff: Duration::from_millis(self.bus.connect_backoff_ms),
            max_attempts: self.bus.max_connect_attempts,
        }
    }

    pub fn window_set(&self) -> AppResult<WindowSet> {
        Ok(WindowSet::new(self.windows.clone())?)
    }

    /// Check everything the loops would otherwise reject at startup.
    pub fn validate(&self) -> AppResult<()> {
        if self.tick_period_ms == 0 {
            return Err(AppError::Validation(
                "tick_period_ms must be positive".to_string(),
            ));
        }
        if !(self.status_interval_s > 0.0) || !self.status_interval_s.is_finite() {
            return Err(AppError::Validation(
                "status_interval_s must be positive".to_string(),
            ));
        }
        if !(0.0..24.0).contains(&self.start_hour) {
            return Err(AppError::Validation(format!(
                "start_hour must be in [0, 24), got {}",
                self.start_hour
            )));
        }
        if self.bus.max_connect_attempts == Some(0) {
            return Err(AppError::Validation(
                "bus.max_connect_attempts must be at least 1".to_string(),
            ));
        }
        self.boiler.validate()?;
        self.thermal.validate()?;
        self.window_set()?;
        for event in &self.scenario {
            if !(event.at_s >= 0.0) || !event.at_s.is_finite() {
                return Err(AppError::Validation(format!(
                    "scenario event on '{}' has invalid time {}",
                    event.topic, event.at_s
                )));
            }
            hl_bus::validate_topic(&event.topic)?;
        }
        Ok(())
    }
}

/// Load a config file. A missing path yields the defaults.
pub fn load_config(path: Option<&Path>) -> AppResult<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Config::from_yaml_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl_sim::SetpointMode;

    #[test]
    fn empty_document_is_default() {
        let config = Config::from_yaml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_dt(), 1.0);
        assert_eq!(config.windows.len(), 4);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let yaml = r#"
tick_period_ms: 500
seed: 7
boiler:
  kp: 4.0
  setpoint_mode: climate_curve
  initial:
    setpoint: 60
windows:
  - id: study
    room: Study
    open: true
scenario:
  - at_s: 30
    topic: otgw/setpoint/set
    payload: "55"
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.tick_dt(), 0.5);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.boiler.kp, 4.0);
        assert_eq!(config.boiler.demand_gain, 0.3);
        assert_eq!(config.boiler.setpoint_mode, SetpointMode::ClimateCurve);
        assert_eq!(config.boiler.initial.setpoint, 60.0);
        assert_eq!(config.boiler.initial.water_temp, 30.0);
        assert_eq!(config.thermal.thermal_capacity, 50_000.0);
        assert_eq!(config.windows.len(), 1);
        assert!(config.windows[0].open);
        assert_eq!(config.scenario[0].payload, "55");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn yaml_roundtrip() {
        let config = Config::default();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(Config::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let zero_tick = Config {
            tick_period_ms: 0,
            ..Config::default()
        };
        assert!(zero_tick.validate().is_err());

        let mut dup = Config::default();
        dup.windows.push(WindowState::closed("kitchen", "Second kitchen"));
        assert!(dup.validate().is_err());

        let mut wildcard = Config::default();
        wildcard.scenario.push(ScenarioEvent {
            at_s: 1.0,
            topic: "otgw/+/set".to_string(),
            payload: "on".to_string(),
        });
        assert!(wildcard.validate().is_err());

        let mut inverted = Config::default();
        inverted.thermal.min_target_temp = 40.0;
        assert!(inverted.validate().is_err());

        let late = Config {
            start_hour: 24.0,
            ..Config::default()
        };
        assert!(late.validate().is_err());
    }

    #[test]
    fn mistyped_values_are_parse_errors() {
        assert!(Config::from_yaml_str("tick_period_ms: fast").is_err());
    }
}
