//! Boiler model.
//!
//! One tick of the boiler, in order:
//! 1. Effective setpoint: the operator setpoint, or the climate curve value in
//!    [`SetpointMode::ClimateCurve`]
//! 2. Target modulation from a proportional controller on water temperature
//!    error with the building's heating demand as feed-forward (zero when
//!    disabled)
//! 3. Burner modulation ramps toward the target at a bounded rate
//! 4. Flame is on above the ignition threshold
//! 5. Water temperature gains heat from the flame and always loses a cooling
//!    term, larger while the heating circuit is circulating
//! 6. Return temperature lags toward `water - return_delta_t`
//! 7. Pressure follows water temperature plus bounded noise
//! 8. Temperatures and pressure are clamped
//!
//! Rates are per second and scaled by the tick length.

use hl_controls::{FirstOrderLag, ProportionalController, RateLimiter};
use hl_core::{clamp_lower_wins, ensure_range, round_to};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::climate::ClimateCurve;
use crate::error::{SimError, SimResult};
use crate::model::TickModel;

/// Where the controller takes its water temperature target from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetpointMode {
    /// Operator setpoint (from the setpoint command).
    #[default]
    Manual,
    /// Climate curve evaluated at the last known outdoor temperature.
    ClimateCurve,
}

/// Boiler state at process start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoilerInitial {
    pub water_temp: f64,
    pub return_temp: f64,
    pub setpoint: f64,
    pub modulation: f64,
    pub pressure: f64,
    pub enabled: bool,
}

impl Default for BoilerInitial {
    fn default() -> Self {
        Self {
            water_temp: 30.0,
            return_temp: 25.0,
            setpoint: 45.0,
            modulation: 0.0,
            pressure: 1.5,
            enabled: true,
        }
    }
}

/// Boiler physical and controller constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoilerParams {
    /// Lower water temperature clamp (°C)
    pub ambient_temp: f64,
    /// Setpoint range (°C)
    pub min_water_temp: f64,
    pub max_water_temp: f64,
    /// Water heating at 100 % modulation (°C/s)
    pub heating_rate: f64,
    /// Natural cooling (°C/s)
    pub cooling_rate: f64,
    /// Supply/return difference the return temperature settles to (°C)
    pub return_delta_t: f64,
    /// Return temperature smoothing per second, in (0, 1]
    pub return_smoothing: f64,
    /// Modulation per °C of setpoint error (%/°C)
    pub kp: f64,
    /// Modulation per % of heating demand
    pub demand_gain: f64,
    /// Burner ramp (%/s)
    pub modulation_rate: f64,
    /// Minimum modulation with the flame lit (%)
    pub ignition_threshold: f64,
    /// Heating demand above which the circuit is circulating (%)
    pub circulation_threshold: f64,
    /// Cooling multiplier while circulating
    pub circulation_cooling_factor: f64,
    /// Pressure at 30 °C (bar)
    pub pressure_base: f64,
    /// Pressure rise per °C above 30 °C (bar/°C)
    pub pressure_coeff: f64,
    /// Half-width of the uniform pressure noise (bar)
    pub pressure_noise: f64,
    pub pressure_min: f64,
    pub pressure_max: f64,
    pub setpoint_mode: SetpointMode,
    pub climate: ClimateCurve,
    pub initial: BoilerInitial,
}

impl Default for BoilerParams {
    fn default() -> Self {
        Self {
            ambient_temp: 20.0,
            min_water_temp: 30.0,
            max_water_temp: 80.0,
            heating_rate: 0.8,
            cooling_rate: 0.15,
            return_delta_t: 10.0,
            return_smoothing: 0.1,
            kp: 3.0,
            demand_gain: 0.3,
            modulation_rate: 2.0,
            ignition_threshold: 5.0,
            circulation_threshold: 10.0,
            circulation_cooling_factor: 1.5,
            pressure_base: 1.5,
            pressure_coeff: 0.003,
            pressure_noise: 0.01,
            pressure_min: 0.5,
            pressure_max: 3.0,
            setpoint_mode: SetpointMode::Manual,
            climate: ClimateCurve::default(),
            initial: BoilerInitial::default(),
        }
    }
}

impl BoilerParams {
    pub fn validate(&self) -> SimResult<()> {
        ensure_range(self.min_water_temp, self.max_water_temp, "boiler setpoint range")?;
        ensure_range(self.ambient_temp, self.max_water_temp, "boiler water range")?;
        ensure_range(self.pressure_min, self.pressure_max, "boiler pressure range")?;
        let non_negative = [
            ("boiler.heating_rate", self.heating_rate),
            ("boiler.cooling_rate", self.cooling_rate),
            ("boiler.return_delta_t", self.return_delta_t),
            ("boiler.demand_gain", self.demand_gain),
            ("boiler.pressure_noise", self.pressure_noise),
            ("boiler.circulation_cooling_factor", self.circulation_cooling_factor),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(SimError::InvalidParam {
                    field,
                    reason: "must be finite and non-negative",
                });
            }
        }
        if !(self.ignition_threshold >= 0.0 && self.ignition_threshold < 100.0) {
            return Err(SimError::InvalidParam {
                field: "boiler.ignition_threshold",
                reason: "must be in [0, 100)",
            });
        }
        self.climate.validate()?;
        // Controller, burner and lag validate their own gains.
        self.controller()?;
        self.burner()?;
        self.return_lag()?;
        Ok(())
    }

    fn controller(&self) -> SimResult<ProportionalController> {
        Ok(ProportionalController::new(self.kp, 0.0, 100.0)?.with_feedforward(self.demand_gain)?)
    }

    fn burner(&self) -> SimResult<RateLimiter> {
        Ok(RateLimiter::new(self.modulation_rate, 0.0, 100.0)?)
    }

    fn return_lag(&self) -> SimResult<FirstOrderLag> {
        Ok(FirstOrderLag::new(self.return_smoothing)?)
    }
}

/// Boiler physical state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoilerState {
    pub water_temp: f64,
    pub return_temp: f64,
    pub setpoint: f64,
    pub modulation: f64,
    pub pressure: f64,
    pub flame_on: bool,
    pub enabled: bool,
}

/// Last known external values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoilerInputs {
    /// Building heating demand (%)
    pub heating_demand: f64,
    pub outdoor_temp: f64,
    pub indoor_temp: f64,
}

impl Default for BoilerInputs {
    fn default() -> Self {
        Self {
            heating_demand: 0.0,
            outdoor_temp: 10.0,
            indoor_temp: 18.0,
        }
    }
}

/// Tick-local quantities, reported for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoilerStepReport {
    pub target_modulation: f64,
    pub effective_setpoint: f64,
    pub climate_setpoint: f64,
    /// Water temperature gained from the flame this tick (°C)
    pub heat_input: f64,
    /// Water temperature lost this tick (°C)
    pub cooling: f64,
}

/// The boiler: parameters, controller, actuator and owned state.
pub struct BoilerModel {
    params: BoilerParams,
    controller: ProportionalController,
    burner: RateLimiter,
    return_lag: FirstOrderLag,
    state: BoilerState,
    rng: StdRng,
}

impl BoilerModel {
    /// Build a boiler at its configured initial state.
    ///
    /// # Arguments
    ///
    /// * `params` - Physical and controller constants
    /// * `seed` - Pressure noise seed; `None` seeds from the OS
    pub fn new(params: BoilerParams, seed: Option<u64>) -> SimResult<Self> {
        params.validate()?;
        let init = &params.initial;
        let state = BoilerState {
            water_temp: clamp_lower_wins(init.water_temp, params.ambient_temp, params.max_water_temp),
            return_temp: clamp_lower_wins(
                init.return_temp,
                params.ambient_temp,
                params.max_water_temp,
            ),
            setpoint: clamp_lower_wins(init.setpoint, params.min_water_temp, params.max_water_temp),
            modulation: clamp_lower_wins(init.modulation, 0.0, 100.0),
            pressure: clamp_lower_wins(init.pressure, params.pressure_min, params.pressure_max),
            flame_on: init.modulation > params.ignition_threshold,
            enabled: init.enabled,
        };
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            controller: params.controller()?,
            burner: params.burner()?,
            return_lag: params.return_lag()?,
            params,
            state,
            rng,
        })
    }

    /// Replace the state, clamping every field into range.
    pub fn with_state(mut self, state: BoilerState) -> Self {
        let p = &self.params;
        let modulation = clamp_lower_wins(state.modulation, 0.0, 100.0);
        self.state = BoilerState {
            water_temp: clamp_lower_wins(state.water_temp, p.ambient_temp, p.max_water_temp),
            return_temp: clamp_lower_wins(state.return_temp, p.ambient_temp, p.max_water_temp),
            setpoint: clamp_lower_wins(state.setpoint, p.min_water_temp, p.max_water_temp),
            modulation,
            pressure: clamp_lower_wins(state.pressure, p.pressure_min, p.pressure_max),
            flame_on: modulation > p.ignition_threshold,
            enabled: state.enabled,
        };
        self
    }

    pub fn params(&self) -> &BoilerParams {
        &self.params
    }

    /// Write the operator setpoint, clamped to the setpoint range.
    /// Returns the value stored.
    ///
    /// # Errors
    ///
    /// Returns error for a non-finite value; the setpoint is left unchanged.
    pub fn set_setpoint(&mut self, value: f64) -> SimResult<f64> {
        let value = hl_core::ensure_finite(value, "setpoint")?;
        self.state.setpoint =
            clamp_lower_wins(value, self.params.min_water_temp, self.params.max_water_temp);
        Ok(self.state.setpoint)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.state.enabled = enabled;
    }

    /// Water temperature target for this tick.
    pub fn effective_setpoint(&self, inputs: &BoilerInputs) -> f64 {
        match self.params.setpoint_mode {
            SetpointMode::Manual => self.state.setpoint,
            SetpointMode::ClimateCurve => clamp_lower_wins(
                self.params.climate.setpoint(inputs.outdoor_temp),
                self.params.min_water_temp,
                self.params.max_water_temp,
            ),
        }
    }

    /// Controller output before rate limiting.
    pub fn target_modulation(&self, inputs: &BoilerInputs) -> f64 {
        if !self.state.enabled {
            return 0.0;
        }
        let demand = clamp_lower_wins(inputs.heating_demand, 0.0, 100.0);
        self.controller.update_with_feedforward(
            self.state.water_temp,
            self.effective_setpoint(inputs),
            demand,
        )
    }

    /// Largest modulation change over a tick of `dt` seconds.
    pub fn max_modulation_step(&self, dt: f64) -> f64 {
        self.burner.max_step(dt)
    }

    fn pressure_for(&mut self, water_temp: f64) -> f64 {
        let p = &self.params;
        let noise = if p.pressure_noise > 0.0 {
            self.rng.gen_range(-p.pressure_noise..=p.pressure_noise)
        } else {
            0.0
        };
        let raw = p.pressure_base + (water_temp - 30.0) * p.pressure_coeff + noise;
        clamp_lower_wins(round_to(raw, 2), p.pressure_min, p.pressure_max)
    }
}

impl TickModel for BoilerModel {
    type Inputs = BoilerInputs;
    type State = BoilerState;
    type Report = BoilerStepReport;

    fn state(&self) -> &BoilerState {
        &self.state
    }

    fn step(&mut self, inputs: &BoilerInputs, dt: f64) -> BoilerStepReport {
        let dt = dt.max(0.0);
        let climate_setpoint = self.params.climate.setpoint(inputs.outdoor_temp);
        let effective_setpoint = self.effective_setpoint(inputs);
        let target_modulation = self.target_modulation(inputs);

        let modulation = self
            .burner
            .step(self.state.modulation, target_modulation, dt);
        let flame_on = modulation > self.params.ignition_threshold;

        let heat_input = if flame_on {
            modulation / 100.0 * self.params.heating_rate * dt
        } else {
            0.0
        };
        let mut cooling = self.params.cooling_rate * dt;
        if inputs.heating_demand > self.params.circulation_threshold {
            cooling *= self.params.circulation_cooling_factor;
        }
        let water_temp = self.state.water_temp + heat_input - cooling;

        let return_target = water_temp - self.params.return_delta_t;
        let return_temp = self
            .return_lag
            .step_over(self.state.return_temp, return_target, dt);

        let pressure = self.pressure_for(water_temp);

        let (lo, hi) = (self.params.ambient_temp, self.params.max_water_temp);
        self.state.modulation = modulation;
        self.state.flame_on = flame_on;
        self.state.water_temp = clamp_lower_wins(water_temp, lo, hi);
        self.state.return_temp = clamp_lower_wins(return_temp, lo, hi);
        self.state.pressure = pressure;

        BoilerStepReport {
            target_modulation,
            effective_setpoint,
            climate_setpoint,
            heat_input,
            cooling,
        }
    }
}
