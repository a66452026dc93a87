//! Physical models for hydroloop.
//!
//! Provides:
//! - Boiler model: rate-limited proportional burner control, water/return
//!   temperature integration, pressure with bounded noise
//! - Building thermal model: envelope heat loss (window dependent), radiator
//!   heat delivery, indoor temperature integration, heating demand controller
//! - Diurnal outdoor weather and climate compensation curve
//! - Window set bookkeeping
//!
//! Models are plain owned structs: each is mutated only by its owner through
//! `step` and command setters, and every integrated quantity is clamped on
//! every step.

pub mod boiler;
pub mod climate;
pub mod error;
pub mod model;
pub mod thermal;
pub mod weather;
pub mod windows;

pub use boiler::{
    BoilerInitial, BoilerInputs, BoilerModel, BoilerParams, BoilerState, BoilerStepReport,
    SetpointMode,
};
pub use climate::ClimateCurve;
pub use error::{SimError, SimResult};
pub use model::TickModel;
pub use thermal::{HeatBalance, ThermalInitial, ThermalInputs, ThermalModel, ThermalParams, ThermalState};
pub use weather::DiurnalWeather;
pub use windows::{WindowSet, WindowState, WindowUpdate, default_windows};
