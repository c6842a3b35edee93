//! Demand generator — advances the synthetic load level once per tick.

use ramp_state::{RampDirection, ScalingConfig, SimulationState};

/// One demand step. Pure; the caller owns the single mutable cell.
///
/// Applies the increment exactly once, clamped so demand lands exactly
/// on the ceiling (increasing) or floor (decreasing) and never skips
/// past either, even when the increment does not divide the range.
/// Paused state passes through unchanged. Direction flips and the alert
/// flag belong to the state machine, not here.
pub fn advance(state: &SimulationState, config: &ScalingConfig) -> SimulationState {
    if state.paused {
        return *state;
    }
    let mut next = *state;
    next.demand = match state.direction {
        RampDirection::Increasing => state
            .demand
            .saturating_add(config.demand_increment)
            .min(config.demand_ceiling),
        RampDirection::Decreasing => state
            .demand
            .saturating_sub(config.demand_increment)
            .max(config.demand_floor),
    };
    next
}
