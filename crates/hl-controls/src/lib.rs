//! Control primitives for hydroloop.
//!
//! The boiler and building loops are both discrete-time proportional loops
//! executed once per tick. This crate holds the pieces they share:
//! - Proportional controllers with an optional feed-forward term and clamped output
//! - Rate-limited actuators (burner modulation ramps)
//! - First-order lag smoothing (return-water temperature)
//! - Sample clocks for decimated, tick-aligned work such as status reporting

pub mod actuator;
pub mod controller;
pub mod error;
pub mod sampled;

pub use actuator::{FirstOrderLag, RateLimiter};
pub use controller::ProportionalController;
pub use error::{ControlError, ControlResult};
pub use sampled::{SampleClock, SampleConfig};
