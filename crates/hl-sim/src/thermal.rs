//! Building thermal model.
//!
//! A single lumped thermal mass. Per tick:
//! - outdoor temperature from the diurnal weather model
//! - heat loss through the envelope, `U_eff * (indoor - outdoor) * dt`, with
//!   `U_eff` growing by a fixed increment per open window
//! - heat delivered by the radiators from the supply/return difference,
//!   capped at the radiator's nominal power
//! - indoor temperature integrated from the net heat and clamped
//! - heating demand from a proportional controller on indoor error

use hl_controls::ProportionalController;
use hl_core::{clamp_lower_wins, ensure_finite};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::model::TickModel;
use crate::weather::DiurnalWeather;

/// Building state at process start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalInitial {
    pub indoor_temp: f64,
    pub target_temp: f64,
}

impl Default for ThermalInitial {
    fn default() -> Self {
        Self {
            indoor_temp: 18.0,
            target_temp: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalParams {
    /// Thermal mass of the building (kJ/°C)
    pub thermal_capacity: f64,
    /// Envelope loss coefficient with every window closed (kW/°C)
    pub u_closed: f64,
    /// Added loss per open window (kW/°C)
    pub u_per_open_window: f64,
    /// Radiator nominal power (kW)
    pub radiator_power: f64,
    /// Water specific heat (kJ/(kg·°C))
    pub specific_heat: f64,
    /// Heating circuit flow (kg/s)
    pub flow_rate: f64,
    /// Demand per °C below target (%/°C)
    pub kp_demand: f64,
    /// Absolute indoor ceiling (°C)
    pub indoor_ceiling: f64,
    /// Indoor floor below the outdoor temperature (°C)
    pub indoor_floor_margin: f64,
    /// Accepted range for target commands (°C)
    pub min_target_temp: f64,
    pub max_target_temp: f64,
    pub weather: DiurnalWeather,
    pub initial: ThermalInitial,
}

impl Default for ThermalParams {
    fn default() -> Self {
        Self {
            thermal_capacity: 50_000.0,
            u_closed: 0.5,
            u_per_open_window: 0.4,
            radiator_power: 8.0,
            specific_heat: 4.186,
            flow_rate: 0.3,
            kp_demand: 20.0,
            indoor_ceiling: 30.0,
            indoor_floor_margin: 2.0,
            min_target_temp: 5.0,
            max_target_temp: 30.0,
            weather: DiurnalWeather::default(),
            initial: ThermalInitial::default(),
        }
    }
}

impl ThermalParams {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.thermal_capacity > 0.0) || !self.thermal_capacity.is_finite() {
            return Err(SimError::InvalidParam {
                field: "thermal.thermal_capacity",
                reason: "must be positive",
            });
        }
        let non_negative = [
            ("thermal.u_closed", self.u_closed),
            ("thermal.u_per_open_window", self.u_per_open_window),
            ("thermal.radiator_power", self.radiator_power),
            ("thermal.specific_heat", self.specific_heat),
            ("thermal.flow_rate", self.flow_rate),
            ("thermal.indoor_floor_margin", self.indoor_floor_margin),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(SimError::InvalidParam {
                    field,
                    reason: "must be finite and non-negative",
                });
            }
        }
        ensure_finite(self.indoor_ceiling, "thermal.indoor_ceiling")?;
        hl_core::ensure_range(self.min_target_temp, self.max_target_temp, "thermal target range")?;
        self.weather.validate()?;
        ProportionalController::new(self.kp_demand, 0.0, 100.0)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalState {
    pub indoor_temp: f64,
    pub outdoor_temp: f64,
    pub target_temp: f64,
    pub heating_demand: f64,
    pub windows_open_count: usize,
}

/// Last known external values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalInputs {
    pub boiler_water_temp: f64,
    pub boiler_return_temp: f64,
    pub windows_open_count: usize,
    /// Hour of day in `[0, 24)` driving the weather model.
    pub hour_of_day: f64,
}

impl Default for ThermalInputs {
    fn default() -> Self {
        Self {
            boiler_water_temp: 45.0,
            boiler_return_temp: 35.0,
            windows_open_count: 0,
            hour_of_day: 0.0,
        }
    }
}

/// Energy balance of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatBalance {
    /// Effective loss coefficient (kW/°C)
    pub u_eff: f64,
    /// Heat lost to outdoors (kJ); negative is a net gain
    pub heat_loss_kj: f64,
    /// Heat delivered by the radiators (kJ)
    pub heat_provided_kj: f64,
}

pub struct ThermalModel {
    params: ThermalParams,
    demand: ProportionalController,
    state: ThermalState,
}

impl ThermalModel {
    /// Build the building at its configured initial state. The outdoor
    /// temperature starts at the weather model's value for `start_hour`.
    pub fn new(params: ThermalParams, start_hour: f64) -> SimResult<Self> {
        params.validate()?;
        let demand = ProportionalController::new(params.kp_demand, 0.0, 100.0)?;
        let outdoor_temp = params.weather.temperature_at(start_hour);
        let target_temp = clamp_lower_wins(
            params.initial.target_temp,
            params.min_target_temp,
            params.max_target_temp,
        );
        let mut model = Self {
            demand,
            state: ThermalState {
                indoor_temp: params.initial.indoor_temp,
                outdoor_temp,
                target_temp,
                heating_demand: 0.0,
                windows_open_count: 0,
            },
            params,
        };
        model.state.indoor_temp = model.clamp_indoor(model.state.indoor_temp, outdoor_temp);
        model.state.heating_demand = model.demand_for(model.state.indoor_temp);
        Ok(model)
    }

    /// Replace the state. Indoor temperature and demand are re-derived
    /// through the usual clamps.
    pub fn with_state(mut self, state: ThermalState) -> Self {
        let indoor = self.clamp_indoor(state.indoor_temp, state.outdoor_temp);
        self.state = ThermalState {
            indoor_temp: indoor,
            outdoor_temp: state.outdoor_temp,
            target_temp: clamp_lower_wins(
                state.target_temp,
                self.params.min_target_temp,
                self.params.max_target_temp,
            ),
            heating_demand: clamp_lower_wins(state.heating_demand, 0.0, 100.0),
            windows_open_count: state.windows_open_count,
        };
        self
    }

    pub fn params(&self) -> &ThermalParams {
        &self.params
    }

    /// Write the comfort target, clamped to the accepted range.
    pub fn set_target(&mut self, value: f64) -> SimResult<f64> {
        let value = ensure_finite(value, "target temperature")?;
        self.state.target_temp =
            clamp_lower_wins(value, self.params.min_target_temp, self.params.max_target_temp);
        Ok(self.state.target_temp)
    }

    /// Envelope loss coefficient for a number of open windows (kW/°C).
    pub fn effective_u(&self, windows_open: usize) -> f64 {
        self.params.u_closed + windows_open as f64 * self.params.u_per_open_window
    }

    /// Heat lost over `dt` seconds (kJ).
    pub fn heat_loss(&self, indoor: f64, outdoor: f64, windows_open: usize, dt: f64) -> f64 {
        self.effective_u(windows_open) * (indoor - outdoor) * dt
    }

    /// Heat the radiators deliver over `dt` seconds (kJ). Zero unless the
    /// supply is warmer than the return.
    pub fn heat_provided(&self, water_temp: f64, return_temp: f64, dt: f64) -> f64 {
        let delta = water_temp - return_temp;
        if !(delta > 0.0) {
            return 0.0;
        }
        let power = self.params.flow_rate * self.params.specific_heat * delta;
        power.min(self.params.radiator_power) * dt
    }

    /// Bounds the indoor temperature may take for a given outdoor temperature.
    /// The lower bound wins if they cross.
    pub fn indoor_bounds(&self, outdoor: f64) -> (f64, f64) {
        (
            outdoor - self.params.indoor_floor_margin,
            self.params.indoor_ceiling,
        )
    }

    fn clamp_indoor(&self, indoor: f64, outdoor: f64) -> f64 {
        let (lo, hi) = self.indoor_bounds(outdoor);
        clamp_lower_wins(indoor, lo, hi)
    }

    fn demand_for(&self, indoor: f64) -> f64 {
        self.demand.update(indoor, self.state.target_temp)
    }
}

impl TickModel for ThermalModel {
    type Inputs = ThermalInputs;
    type State = ThermalState;
    type Report = HeatBalance;

    fn state(&self) -> &ThermalState {
        &self.state
    }

    fn step(&mut self, inputs: &ThermalInputs, dt: f64) -> HeatBalance {
        let dt = dt.max(0.0);
        let outdoor = self.params.weather.temperature_at(inputs.hour_of_day);
        let windows_open = inputs.windows_open_count;
        let indoor = self.state.indoor_temp;

        let balance = HeatBalance {
            u_eff: self.effective_u(windows_open),
            heat_loss_kj: self.heat_loss(indoor, outdoor, windows_open, dt),
            heat_provided_kj: self.heat_provided(
                inputs.boiler_water_temp,
                inputs.boiler_return_temp,
                dt,
            ),
        };

        let delta = (balance.heat_provided_kj - balance.heat_loss_kj) / self.params.thermal_capacity;
        let indoor = self.clamp_indoor(indoor + delta, outdoor);

        self.state.outdoor_temp = outdoor;
        self.state.windows_open_count = windows_open;
        self.state.indoor_temp = indoor;
        self.state.heating_demand = self.demand_for(indoor);
        balance
    }
}
