//! Climate compensation curve.
//!
//! Maps outdoor temperature to a supply water temperature: the colder it is
//! outside, the hotter the water the radiators need.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Linear heating curve with a comfort reference and water limits.
///
/// `setpoint(outdoor) = clamp(base + slope * max(0, reference - outdoor), min, max)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateCurve {
    /// Water temperature at or above the reference outdoor temperature (°C)
    pub base: f64,
    /// Water °C added per °C the outdoor temperature is below the reference
    pub slope: f64,
    /// Outdoor temperature at which no compensation is needed (°C)
    pub reference_outdoor: f64,
    pub min_water: f64,
    pub max_water: f64,
}

impl Default for ClimateCurve {
    fn default() -> Self {
        Self {
            base: 35.0,
            slope: 1.5,
            reference_outdoor: 20.0,
            min_water: 30.0,
            max_water: 80.0,
        }
    }
}

impl ClimateCurve {
    pub fn validate(&self) -> SimResult<()> {
        if !self.base.is_finite() || !self.slope.is_finite() || !self.reference_outdoor.is_finite()
        {
            return Err(SimError::InvalidParam {
                field: "climate",
                reason: "curve coefficients must be finite",
            });
        }
        if self.slope < 0.0 {
            return Err(SimError::InvalidParam {
                field: "climate.slope",
                reason: "must not be negative",
            });
        }
        hl_core::ensure_range(self.min_water, self.max_water, "climate water range")?;
        Ok(())
    }

    /// Water temperature for the given outdoor temperature.
    pub fn setpoint(&self, outdoor: f64) -> f64 {
        let shortfall = (self.reference_outdoor - outdoor).max(0.0);
        hl_core::clamp_lower_wins(
            self.base + self.slope * shortfall,
            self.min_water,
            self.max_water,
        )
    }
}
