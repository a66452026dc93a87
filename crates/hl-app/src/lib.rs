//! Application layer for hydroloop.
//!
//! Wires the physical models to the state exchange channel:
//! - [`runner`]: the [`ControlLoop`] trait and the tick driver shared by both loops
//! - [`boiler_loop`] / [`thermal_loop`]: the two control loops
//! - [`runtime`]: real-time operation, one scheduler thread per loop
//! - [`session`]: accelerated lockstep simulation with scripted scenarios
//! - [`config`], [`export`], [`clock`]: configuration, result output, time of day

pub mod boiler_loop;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod runner;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod thermal_loop;

pub use boiler_loop::{BoilerLoop, BoilerSnapshot};
pub use clock::{Clock, SimulatedClock, SystemClock};
pub use config::{BusConfig, Config, ScenarioEvent, load_config};
pub use error::{AppError, AppResult};
pub use export::{ExportFormat, write_csv, write_json_lines, write_rows};
pub use runner::{ControlLoop, Handled, LoopRunner, RunnerStats};
pub use runtime::{LoopHandle, Runtime, operator_message};
pub use scheduler::PeriodicTask;
pub use session::{Session, SessionRow};
pub use thermal_loop::{ThermalLoop, ThermalSnapshot};
