//! ramp-scale — the autoscaling control loop.
//!
//! One cooperative loop drives everything, once per tick:
//!
//! ```text
//! actual  = runtime.list(group)        (re-queried, never cached)
//! desired = ceil(demand / capacity)    (planner, clamped to min..=max)
//! observer.on_tick(snapshot)
//! intent  = plan(actual, desired)      (reconciler: Create | Terminate | NoOp)
//! execute(intent)                      (runtime ops, per-op error capture)
//! evaluate thresholds                  (state machine: alert / terminate)
//! demand' = advance(demand)            (generator, direction-aware)
//! ```
//!
//! The runtime is re-queried every cycle; a failed operation leaves an
//! actual/desired mismatch that the next cycle corrects. No retries,
//! no backoff — re-observation is the recovery mechanism.

pub mod demand;
pub mod machine;
pub mod planner;
pub mod reconciler;
pub mod simulation;

pub use machine::{SaturationMachine, Transition};
pub use planner::desired_replicas;
pub use reconciler::{Reconciler, ScalingIntent, plan};
pub use simulation::{Simulation, TickOutcome};
