//! Simulation state, instance records, and observer-facing snapshots.

use serde::{Deserialize, Serialize};

use crate::config::ScalingConfig;

/// Unique identifier for a workload instance, as assigned by the runtime.
pub type InstanceId = String;

// ── Instance ──────────────────────────────────────────────────────

/// One running unit of the scaled workload.
///
/// The runtime is authoritative for existence; these records are
/// re-fetched every cycle and never cached across ticks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instance {
    pub id: InstanceId,
    /// Human-readable container name (`{app}-{millis}-{rand}`).
    pub name: String,
    /// Host port mapped to the workload port, if published.
    pub port: Option<u16>,
    /// Creation order index, stored as the `instance` label.
    ///
    /// Scale-down selects the last N by this index (LIFO), independent
    /// of the runtime's listing order.
    pub sequence: u32,
}

// ── Simulation state ──────────────────────────────────────────────

/// Which way the synthetic demand ramp is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RampDirection {
    Increasing,
    Decreasing,
}

/// Phase of the saturation-alert state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    RampingUp,
    AlertPaused,
    RampingDown,
    Terminated,
}

/// The mutable simulation state, written only by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Synthetic load level. Clamped to `[floor, ceiling]` after every
    /// update; downstream components never observe it out of range.
    pub demand: u32,
    pub direction: RampDirection,
    /// True only while the saturation alert suspends the ramp.
    pub paused: bool,
    /// One-shot: transitions false → true at most once per run and is
    /// never reset.
    pub alert_fired: bool,
}

impl SimulationState {
    /// Initial state: no demand, ramping up, not paused, alert armed.
    pub fn new() -> Self {
        Self {
            demand: 0,
            direction: RampDirection::Increasing,
            paused: false,
            alert_fired: false,
        }
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new()
    }
}

// ── Observer payloads ─────────────────────────────────────────────

/// Point-in-time view of the control loop, pushed to the observer once
/// per tick and on state-machine transitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub demand: u32,
    pub direction: RampDirection,
    pub paused: bool,
    pub alert_fired: bool,
    pub phase: Phase,
    /// Target replica count from the capacity planner.
    pub desired: u32,
    /// Actual instances, as listed from the runtime this cycle.
    pub instances: Vec<Instance>,
}

/// Context attached to the one-shot saturation alert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertContext {
    /// Demand at the moment the ceiling was hit.
    pub demand: u32,
    /// The most demand the fleet can serve at max replicas.
    pub max_capacity: u32,
    /// Configured replica ceiling.
    pub replica_ceiling: u32,
    /// Hosts needed to serve the current demand at `max_capacity` each.
    pub servers_needed: u32,
    /// Demand beyond what this host can serve.
    pub excess_demand: u32,
}

impl AlertContext {
    /// Derive alert figures from the current demand and config.
    pub fn compute(demand: u32, config: &ScalingConfig) -> Self {
        let max_capacity = config.max_servable_capacity();
        Self {
            demand,
            max_capacity,
            replica_ceiling: config.max_replicas,
            servers_needed: demand.div_ceil(max_capacity.max(1)),
            excess_demand: demand.saturating_sub(max_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let state = SimulationState::new();
        assert_eq!(state.demand, 0);
        assert_eq!(state.direction, RampDirection::Increasing);
        assert!(!state.paused);
        assert!(!state.alert_fired);
    }

    #[test]
    fn alert_context_figures() {
        let config = ScalingConfig::default();
        let ctx = AlertContext::compute(2000, &config);
        assert_eq!(ctx.max_capacity, 2000);
        assert_eq!(ctx.servers_needed, 1);
        assert_eq!(ctx.excess_demand, 0);

        let ctx = AlertContext::compute(4500, &config);
        assert_eq!(ctx.servers_needed, 3);
        assert_eq!(ctx.excess_demand, 2500);
    }

    #[test]
    fn snapshot_round_trips_as_json() {
        let snapshot = Snapshot {
            demand: 700,
            direction: RampDirection::Increasing,
            paused: false,
            alert_fired: false,
            phase: Phase::RampingUp,
            desired: 2,
            instances: vec![Instance {
                id: "abc123".to_string(),
                name: "test-app-1-0".to_string(),
                port: Some(55001),
                sequence: 1,
            }],
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
