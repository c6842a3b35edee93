//! Observer seam — a one-way push of control-loop state.
//!
//! The observer renders snapshots and alerts; it has no channel back
//! into the core and its implementation never affects scaling.

use std::time::Duration;

use crate::types::{AlertContext, Snapshot};

/// Receives control-loop state once per tick and on transitions.
pub trait Observer: Send + Sync {
    /// Called once per tick with the freshly computed snapshot.
    fn on_tick(&self, snapshot: &Snapshot);

    /// Called exactly once per run, when the saturation alert fires.
    fn on_alert(&self, ctx: &AlertContext);

    /// Called once per second while the alert pause counts down.
    fn on_countdown(&self, remaining: Duration);

    /// Called with the final snapshot before the terminal drain.
    fn on_terminated(&self, snapshot: &Snapshot);
}

/// Observer that discards everything. Used by tests and headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn on_tick(&self, _snapshot: &Snapshot) {}
    fn on_alert(&self, _ctx: &AlertContext) {}
    fn on_countdown(&self, _remaining: Duration) {}
    fn on_terminated(&self, _snapshot: &Snapshot) {}
}
