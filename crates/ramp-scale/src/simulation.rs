//! The control loop — one cooperative task driving the whole scenario.
//!
//! Ticks are strictly sequential: a tick's reconciliation is fully
//! awaited before the next tick fires. `SimulationState` has a single
//! writer (this loop); the runtime adapter is the only other mutable
//! resource and is re-queried each cycle. During the alert pause the
//! loop suspends demand/reconciliation but keeps servicing the
//! countdown and the shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use ramp_runtime::ContainerRuntime;
use ramp_state::{
    AlertContext, Instance, Observer, Phase, ScalingConfig, SimulationState, Snapshot,
};

use crate::demand;
use crate::machine::{SaturationMachine, Transition};
use crate::planner::desired_replicas;
use crate::reconciler::Reconciler;

/// What a single tick concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Normal tick; demand advanced.
    Progressed,
    /// Ceiling hit: the caller must run the pause, then resume.
    AlertRaised(AlertContext),
    /// Floor hit: the caller drains and exits.
    Finished,
}

/// Owns the simulation state and wires the components together.
pub struct Simulation {
    config: ScalingConfig,
    runtime: Arc<dyn ContainerRuntime>,
    observer: Arc<dyn Observer>,
    reconciler: Reconciler,
    state: SimulationState,
    machine: SaturationMachine,
}

impl Simulation {
    pub fn new(
        config: ScalingConfig,
        runtime: Arc<dyn ContainerRuntime>,
        observer: Arc<dyn Observer>,
    ) -> Self {
        let reconciler = Reconciler::new(config.clone(), Arc::clone(&runtime));
        Self {
            config,
            runtime,
            observer,
            reconciler,
            state: SimulationState::new(),
            machine: SaturationMachine::new(),
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    /// Run the scenario to completion or until `shutdown` flips.
    /// Both exits end with a drain.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let period = self.config.tick_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        // Reconciliation may outlast the interval; never burst to catch up.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            tick_ms = period.as_millis() as u64,
            app = %self.config.app_name,
            "control loop started"
        );

        let mut interrupted = false;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick().await {
                        TickOutcome::Progressed => {}
                        TickOutcome::AlertRaised(ctx) => {
                            self.observer.on_alert(&ctx);
                            if !self.pause_countdown(&mut shutdown).await {
                                interrupted = true;
                                break;
                            }
                            self.machine.resume(&mut self.state);
                            info!("alert pause elapsed; ramp resuming in decreasing mode");
                            ticker.reset();
                        }
                        TickOutcome::Finished => {
                            let actual = self.actual_instances().await;
                            let desired = desired_replicas(self.state.demand, &self.config);
                            self.observer.on_terminated(&self.snapshot(desired, actual));
                            info!(demand = self.state.demand, "simulation complete");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    interrupted = true;
                    break;
                }
            }
        }

        if interrupted {
            info!("interrupt received; draining before exit");
        }
        self.drain().await;
        Ok(())
    }

    /// One control-loop cycle: observe, plan, reconcile, evaluate,
    /// advance. Always completes; component failures are captured
    /// inside the reconciler.
    pub async fn tick(&mut self) -> TickOutcome {
        let actual = self.actual_instances().await;
        let desired = desired_replicas(self.state.demand, &self.config);

        self.observer
            .on_tick(&self.snapshot(desired, actual.clone()));

        self.reconciler
            .execute(&actual, desired, self.state.demand)
            .await;

        match self.machine.evaluate(&mut self.state, &self.config) {
            Transition::RaiseAlert(ctx) => return TickOutcome::AlertRaised(ctx),
            Transition::Terminate => return TickOutcome::Finished,
            Transition::None => {}
        }

        self.state = demand::advance(&self.state, &self.config);
        TickOutcome::Progressed
    }

    /// Stop and remove every instance in the scaling group.
    pub async fn drain(&self) -> usize {
        self.reconciler.drain().await
    }

    /// Wait out the alert pause, emitting a per-second countdown.
    /// Returns false if shutdown arrived mid-pause.
    async fn pause_countdown(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        let total_secs = self.config.alert_pause.as_secs();
        for remaining in (1..=total_secs).rev() {
            self.observer.on_countdown(Duration::from_secs(remaining));
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                _ = shutdown.changed() => return false,
            }
        }
        true
    }

    /// Query the runtime for the actual set. A listing failure degrades
    /// to an empty set: the cycle may then request redundant creations
    /// that over-provision until the next accurate count self-corrects.
    async fn actual_instances(&self) -> Vec<Instance> {
        match self.runtime.list(&self.config.app_name).await {
            Ok(instances) => instances,
            Err(e) => {
                warn!(error = %e, "instance listing failed; treating actual set as empty");
                Vec::new()
            }
        }
    }

    fn snapshot(&self, desired: u32, instances: Vec<Instance>) -> Snapshot {
        Snapshot {
            demand: self.state.demand,
            direction: self.state.direction,
            paused: self.state.paused,
            alert_fired: self.state.alert_fired,
            phase: self.machine.phase(),
            desired,
            instances,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ramp_runtime::MemoryRuntime;
    use ramp_state::NullObserver;

    fn fast_config() -> ScalingConfig {
        ScalingConfig {
            tick_interval: Duration::from_millis(1),
            alert_pause: Duration::ZERO,
            creation_stagger: Duration::ZERO,
            ..ScalingConfig::default()
        }
    }

    fn simulation(runtime: Arc<MemoryRuntime>) -> Simulation {
        Simulation::new(fast_config(), runtime, Arc::new(NullObserver))
    }

    #[tokio::test]
    async fn first_tick_provisions_the_minimum() {
        let runtime = Arc::new(MemoryRuntime::new());
        let mut sim = simulation(runtime.clone());

        assert_eq!(sim.tick().await, TickOutcome::Progressed);
        assert_eq!(runtime.running_count(), 1);
        assert_eq!(sim.state().demand, 100);
    }

    #[tokio::test]
    async fn fleet_converges_within_one_cycle_of_each_step() {
        let runtime = Arc::new(MemoryRuntime::new());
        let mut sim = simulation(runtime.clone());

        loop {
            let demand_before = sim.state().demand;
            let outcome = sim.tick().await;
            let expected = desired_replicas(demand_before, &fast_config());
            assert_eq!(
                runtime.running_count() as u32,
                expected,
                "at demand {demand_before}"
            );
            if outcome != TickOutcome::Progressed {
                break;
            }
        }
    }

    #[tokio::test]
    async fn ceiling_tick_raises_alert_after_scaling_to_max() {
        let runtime = Arc::new(MemoryRuntime::new());
        let mut sim = simulation(runtime.clone());

        let outcome = loop {
            match sim.tick().await {
                TickOutcome::Progressed => {}
                other => break other,
            }
        };

        assert!(matches!(outcome, TickOutcome::AlertRaised(_)));
        assert_eq!(sim.phase(), Phase::AlertPaused);
        assert_eq!(sim.state().demand, 2000);
        assert!(sim.state().alert_fired);
        assert_eq!(runtime.running_count(), 4);
    }

    #[tokio::test]
    async fn listing_failure_over_provisions_then_self_corrects() {
        let runtime = Arc::new(MemoryRuntime::new());
        let mut sim = simulation(runtime.clone());

        // Ramp until the tick at demand 600 has run (first 2-replica step).
        while sim.state().demand < 700 {
            sim.tick().await;
        }
        assert_eq!(runtime.running_count(), 2);

        // Preserved-fidelity behavior: a failed listing reads as zero
        // actual instances, so this cycle creates redundant replicas.
        runtime.fail_next_list();
        sim.tick().await;
        assert_eq!(runtime.running_count(), 4);

        // The next accurate count scales back down to desired.
        sim.tick().await;
        assert_eq!(
            runtime.running_count() as u32,
            desired_replicas(sim.state().demand, &fast_config())
        );
    }

    #[tokio::test]
    async fn run_drives_full_scenario_and_drains() {
        let runtime = Arc::new(MemoryRuntime::new());
        let mut sim = simulation(runtime.clone());

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        sim.run(shutdown_rx).await.unwrap();

        assert_eq!(sim.phase(), Phase::Terminated);
        assert_eq!(sim.state().demand, 400);
        assert!(sim.state().alert_fired);
        assert_eq!(runtime.total_count(), 0, "terminal drain empties the group");
    }

    #[tokio::test]
    async fn shutdown_interrupts_and_drains() {
        let runtime = Arc::new(MemoryRuntime::new());
        let config = ScalingConfig {
            tick_interval: Duration::from_millis(5),
            creation_stagger: Duration::ZERO,
            ..ScalingConfig::default()
        };
        let mut sim = Simulation::new(config, runtime.clone(), Arc::new(NullObserver));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            let _ = shutdown_tx.send(true);
        });

        sim.run(shutdown_rx).await.unwrap();
        assert_eq!(runtime.total_count(), 0, "interrupt path also drains");
    }
}
