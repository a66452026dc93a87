//! Proportional controller.
//!
//! Both loops in the plant use pure proportional action:
//! - the boiler turns water-temperature error (plus a demand feed-forward) into
//!   a burner modulation target
//! - the building turns indoor-temperature error into a heating demand
//!
//! The controller is stateless; the output is clamped on every update.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// Proportional controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProportionalController {
    /// Proportional gain (output units per unit of error).
    pub kp: f64,
    /// Gain applied to the feed-forward input.
    pub kff: f64,
    /// Minimum output value.
    pub out_min: f64,
    /// Maximum output value.
    pub out_max: f64,
}

impl ProportionalController {
    /// Create a new proportional controller without feed-forward.
    ///
    /// # Arguments
    ///
    /// * `kp` - Proportional gain
    /// * `out_min` - Minimum output
    /// * `out_max` - Maximum output
    pub fn new(kp: f64, out_min: f64, out_max: f64) -> ControlResult<Self> {
        if !kp.is_finite() {
            return Err(ControlError::InvalidArg {
                what: "kp must be finite",
            });
        }
        if !(out_min < out_max) {
            return Err(ControlError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        Ok(Self {
            kp,
            kff: 0.0,
            out_min,
            out_max,
        })
    }

    /// Set the feed-forward gain.
    pub fn with_feedforward(mut self, kff: f64) -> ControlResult<Self> {
        if !kff.is_finite() {
            return Err(ControlError::InvalidArg {
                what: "kff must be finite",
            });
        }
        self.kff = kff;
        Ok(self)
    }

    /// Compute controller output given process variable and setpoint.
    pub fn update(&self, pv: f64, sp: f64) -> f64 {
        self.update_with_feedforward(pv, sp, 0.0)
    }

    /// Compute controller output with an additional feed-forward input.
    ///
    /// `output = clamp(kp * (sp - pv) + kff * ff, out_min, out_max)`
    pub fn update_with_feedforward(&self, pv: f64, sp: f64, ff: f64) -> f64 {
        // Error: e = sp - pv (positive error means PV is below setpoint)
        let error = sp - pv;
        let raw = self.kp * error + self.kff * ff;
        if raw.is_nan() {
            return self.out_min;
        }
        raw.clamp(self.out_min, self.out_max)
    }
}
