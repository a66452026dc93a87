//! hl-core: stable foundation for hydroloop.
//!
//! Contains:
//! - numeric (finite checks, range checks, clamping, rounding)
//! - parse (bus payload parsing with typed rejection reasons)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod parse;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::{clamp_lower_wins, ensure_finite, ensure_range, round_to};
pub use parse::{PayloadError, PayloadResult, Switch, parse_number, parse_switch, parse_window};
