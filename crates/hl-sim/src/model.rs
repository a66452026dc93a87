//! TickModel trait for fixed-step plant models.

/// A discrete-time plant advanced one tick at a time.
///
/// A TickModel must provide:
/// - an owned state type, cloned for snapshots
/// - the per-tick external inputs it reads
/// - a step that mutates the state in place and reports tick-local
///   quantities (heat flows, controller targets) that are not part of the state
pub trait TickModel {
    /// Inputs read at the start of a tick (last known external values).
    type Inputs;
    /// Persistent state (must be Clone).
    type State: Clone;
    /// Per-tick report.
    type Report;

    fn state(&self) -> &Self::State;

    /// Advance the model by `dt` seconds.
    fn step(&mut self, inputs: &Self::Inputs, dt: f64) -> Self::Report;
}
