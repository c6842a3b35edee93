//! Saturation-alert state machine.
//!
//! Governs ramp direction, the one-shot alert, the timed pause, and the
//! terminal drain. Phases: `RampingUp → AlertPaused → RampingDown →
//! Terminated`. The alert-fired flag is part of the `RampingUp →
//! AlertPaused` transition guard and is never reset, so a second
//! ceiling touch cannot re-trigger the pause.

use tracing::info;

use ramp_state::{AlertContext, Phase, RampDirection, ScalingConfig, SimulationState};

/// Outcome of one threshold evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// No threshold crossed.
    None,
    /// Ceiling reached with the alert still armed: pause begins.
    RaiseAlert(AlertContext),
    /// Floor reached while descending: drain and exit.
    Terminate,
}

/// Tracks the current phase and applies transition guards.
#[derive(Debug)]
pub struct SaturationMachine {
    phase: Phase,
}

impl SaturationMachine {
    pub fn new() -> Self {
        Self {
            phase: Phase::RampingUp,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Evaluate ceiling/floor crossings after a tick's reconciliation.
    ///
    /// On `RaiseAlert` this sets the one-shot flag and suspends the
    /// ramp; the caller runs the pause countdown and then calls
    /// [`resume`](Self::resume).
    pub fn evaluate(
        &mut self,
        state: &mut SimulationState,
        config: &ScalingConfig,
    ) -> Transition {
        match self.phase {
            Phase::RampingUp => {
                if state.demand >= config.demand_ceiling && !state.alert_fired {
                    state.alert_fired = true;
                    state.paused = true;
                    self.phase = Phase::AlertPaused;
                    let ctx = AlertContext::compute(state.demand, config);
                    info!(
                        demand = state.demand,
                        max_capacity = ctx.max_capacity,
                        servers_needed = ctx.servers_needed,
                        "saturation ceiling reached; alert raised"
                    );
                    return Transition::RaiseAlert(ctx);
                }
                Transition::None
            }
            // Demand updates and reconciliation are suspended; nothing
            // to evaluate until the pause elapses.
            Phase::AlertPaused => Transition::None,
            Phase::RampingDown => {
                if state.demand <= config.demand_floor {
                    self.phase = Phase::Terminated;
                    info!(demand = state.demand, "demand floor reached");
                    return Transition::Terminate;
                }
                Transition::None
            }
            Phase::Terminated => Transition::Terminate,
        }
    }

    /// `AlertPaused → RampingDown`: flip the ramp to decreasing and
    /// resume demand updates. No-op in any other phase.
    pub fn resume(&mut self, state: &mut SimulationState) {
        if self.phase == Phase::AlertPaused {
            self.phase = Phase::RampingDown;
            state.direction = RampDirection::Decreasing;
            state.paused = false;
        }
    }
}

impl Default for SaturationMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScalingConfig {
        ScalingConfig::default() // ceiling 2000, floor 400
    }

    #[test]
    fn starts_ramping_up() {
        assert_eq!(SaturationMachine::new().phase(), Phase::RampingUp);
    }

    #[test]
    fn below_ceiling_no_transition() {
        let mut machine = SaturationMachine::new();
        let mut state = SimulationState {
            demand: 1900,
            ..SimulationState::new()
        };
        assert_eq!(machine.evaluate(&mut state, &config()), Transition::None);
        assert!(!state.alert_fired);
    }

    #[test]
    fn ceiling_raises_alert_and_pauses() {
        let mut machine = SaturationMachine::new();
        let mut state = SimulationState {
            demand: 2000,
            ..SimulationState::new()
        };
        let transition = machine.evaluate(&mut state, &config());
        assert!(matches!(transition, Transition::RaiseAlert(_)));
        assert_eq!(machine.phase(), Phase::AlertPaused);
        assert!(state.alert_fired);
        assert!(state.paused);
    }

    #[test]
    fn alert_fires_at_most_once() {
        let config = config();
        let mut machine = SaturationMachine::new();
        let mut state = SimulationState {
            demand: 2000,
            ..SimulationState::new()
        };
        assert!(matches!(
            machine.evaluate(&mut state, &config),
            Transition::RaiseAlert(_)
        ));

        // Demand sits at the ceiling for several evaluations while the
        // pause elapses; the flag stays set and nothing re-fires.
        for _ in 0..5 {
            assert_eq!(machine.evaluate(&mut state, &config), Transition::None);
            assert!(state.alert_fired);
        }
    }

    #[test]
    fn resume_flips_direction_and_unpauses() {
        let mut machine = SaturationMachine::new();
        let mut state = SimulationState {
            demand: 2000,
            ..SimulationState::new()
        };
        machine.evaluate(&mut state, &config());
        machine.resume(&mut state);

        assert_eq!(machine.phase(), Phase::RampingDown);
        assert_eq!(state.direction, RampDirection::Decreasing);
        assert!(!state.paused);
        assert!(state.alert_fired, "flag is never reset");
    }

    #[test]
    fn resume_outside_pause_is_noop() {
        let mut machine = SaturationMachine::new();
        let mut state = SimulationState::new();
        machine.resume(&mut state);
        assert_eq!(machine.phase(), Phase::RampingUp);
        assert_eq!(state.direction, RampDirection::Increasing);
    }

    #[test]
    fn floor_terminates_descending_ramp() {
        let config = config();
        let mut machine = SaturationMachine::new();
        let mut state = SimulationState {
            demand: 2000,
            ..SimulationState::new()
        };
        machine.evaluate(&mut state, &config);
        machine.resume(&mut state);

        state.demand = 500;
        assert_eq!(machine.evaluate(&mut state, &config), Transition::None);

        state.demand = 400;
        assert_eq!(machine.evaluate(&mut state, &config), Transition::Terminate);
        assert_eq!(machine.phase(), Phase::Terminated);
    }

    #[test]
    fn terminated_is_terminal() {
        let config = config();
        let mut machine = SaturationMachine::new();
        let mut state = SimulationState {
            demand: 2000,
            ..SimulationState::new()
        };
        machine.evaluate(&mut state, &config);
        machine.resume(&mut state);
        state.demand = 400;
        assert_eq!(machine.evaluate(&mut state, &config), Transition::Terminate);
        assert_eq!(machine.evaluate(&mut state, &config), Transition::Terminate);
    }
}
