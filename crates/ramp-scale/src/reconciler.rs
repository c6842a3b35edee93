//! Reconciler — diffs desired vs. actual replicas into lifecycle ops.
//!
//! `plan()` is pure: it turns (actual set, desired count) into a single
//! [`ScalingIntent`]. `Reconciler::execute()` carries the intent out
//! against the runtime with per-operation error capture — one failed
//! create/stop/remove never aborts its siblings or the tick; the
//! resulting mismatch is corrected by the next cycle's re-observation.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures::future::join_all;
use tracing::{debug, info, warn};

use ramp_runtime::{ContainerRuntime, InstanceSpec};
use ramp_state::{Instance, InstanceId, ScalingConfig};

/// What one reconciliation cycle decided to do.
///
/// Create and Terminate are mutually exclusive within a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalingIntent {
    /// Launch this many new instances.
    Create(u32),
    /// Stop and remove these instances, most recently created first.
    Terminate(Vec<InstanceId>),
    /// Actual already matches desired.
    NoOp,
}

/// Diff the actual instance set against the desired count.
///
/// Scale-down selects the `len(actual) - desired` most recently created
/// instances by their sequence label (LIFO), so the oldest instances
/// survive regardless of the runtime's listing order.
pub fn plan(actual: &[Instance], desired: u32) -> ScalingIntent {
    let current = actual.len() as u32;
    if current < desired {
        return ScalingIntent::Create(desired - current);
    }
    if current > desired {
        let excess = (current - desired) as usize;
        let mut by_age: Vec<&Instance> = actual.iter().collect();
        by_age.sort_by_key(|i| i.sequence);
        let victims = by_age
            .iter()
            .rev()
            .take(excess)
            .map(|i| i.id.clone())
            .collect();
        return ScalingIntent::Terminate(victims);
    }
    ScalingIntent::NoOp
}

/// Executes scaling intents and drains against the runtime adapter.
pub struct Reconciler {
    config: ScalingConfig,
    runtime: Arc<dyn ContainerRuntime>,
}

impl Reconciler {
    pub fn new(config: ScalingConfig, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { config, runtime }
    }

    /// Run one reconciliation cycle.
    ///
    /// All operations are awaited before this returns; the next tick
    /// never overlaps an in-flight reconciliation.
    pub async fn execute(&self, actual: &[Instance], desired: u32, demand: u32) {
        match plan(actual, desired) {
            ScalingIntent::Create(count) => {
                // Past the servable ceiling, desired is already clamped
                // to max by the planner; excess demand surfaces via the
                // alert rather than extra replicas.
                if demand > self.config.max_servable_capacity() {
                    debug!(
                        demand,
                        max_capacity = self.config.max_servable_capacity(),
                        "demand beyond servable capacity; scale-up suppressed"
                    );
                    return;
                }
                self.scale_up(actual, count, desired, demand).await;
            }
            ScalingIntent::Terminate(victims) => {
                self.scale_down(victims, desired, demand).await;
            }
            ScalingIntent::NoOp => {
                debug!(desired, "replica count at target");
            }
        }
    }

    /// Launch `count` instances, staggered, each error-isolated.
    async fn scale_up(&self, actual: &[Instance], count: u32, desired: u32, demand: u32) {
        info!(add = count, desired, demand, "scaling up");

        // Sequence numbering continues from what the runtime reports,
        // not from a cached counter, so LIFO selection stays correct
        // after failures or restarts.
        let next_seq = actual.iter().map(|i| i.sequence).max().unwrap_or(0) + 1;
        let stagger = self.config.creation_stagger;

        let launches = (0..count).map(|offset| {
            let runtime = Arc::clone(&self.runtime);
            let spec = self.instance_spec(next_seq + offset);
            async move {
                if offset > 0 {
                    tokio::time::sleep(stagger * offset).await;
                }
                match runtime.create(&spec).await {
                    Ok(instance) => {
                        info!(
                            name = %instance.name,
                            id = %instance.id,
                            port = ?instance.port,
                            sequence = instance.sequence,
                            "instance started"
                        );
                        true
                    }
                    Err(e) => {
                        warn!(name = %spec.name, error = %e, "instance creation failed");
                        false
                    }
                }
            }
        });

        let created = join_all(launches).await.iter().filter(|ok| **ok).count();
        info!(created, requested = count, "scale-up cycle complete");
    }

    /// Stop and remove each victim; later failures never undo earlier
    /// terminations.
    async fn scale_down(&self, victims: Vec<InstanceId>, desired: u32, demand: u32) {
        info!(remove = victims.len(), desired, demand, "scaling down");

        for id in victims {
            if let Err(e) = self.runtime.stop(&id, self.config.stop_timeout).await {
                warn!(%id, error = %e, "graceful stop failed");
                continue;
            }
            match self.runtime.remove(&id).await {
                Ok(()) => info!(%id, "instance terminated"),
                Err(e) => warn!(%id, error = %e, "instance removal failed"),
            }
        }
    }

    /// Stop and remove every instance in the scaling group, including
    /// non-running leftovers. Idempotent and best-effort: per-instance
    /// failures are logged and the sweep continues.
    pub async fn drain(&self) -> usize {
        let instances = match self.runtime.list_all(&self.config.app_name).await {
            Ok(instances) => instances,
            Err(e) => {
                warn!(error = %e, "drain could not list instances");
                return 0;
            }
        };
        if instances.is_empty() {
            debug!("drain found nothing to remove");
            return 0;
        }

        info!(count = instances.len(), "draining scaling group");
        let mut removed = 0;
        for instance in instances {
            if let Err(e) = self
                .runtime
                .stop(&instance.id, self.config.drain_stop_timeout)
                .await
            {
                // Stopped containers are expected here; removal below
                // is what actually matters.
                debug!(id = %instance.id, error = %e, "drain stop failed");
            }
            match self.runtime.remove(&instance.id).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(id = %instance.id, error = %e, "drain removal failed"),
            }
        }
        info!(removed, "drain complete");
        removed
    }

    /// Build the creation spec for sequence number `sequence`.
    fn instance_spec(&self, sequence: u32) -> InstanceSpec {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        // Sequence keeps names unique within one burst; the nanos nonce
        // keeps them unique across bursts in the same millisecond.
        let nonce = now.subsec_nanos() % 997 + sequence;
        let name = format!("{}-{}-{}", self.config.app_name, now.as_millis(), nonce);

        InstanceSpec {
            image: self.config.image.clone(),
            group: self.config.app_name.clone(),
            sequence,
            container_port: self.config.container_port,
            cpu_limit: self.config.container_cpu,
            memory_limit_gb: self.config.container_memory_gb,
            env: vec![
                ("INSTANCE_NAME".to_string(), name.clone()),
                ("PORT".to_string(), self.config.container_port.to_string()),
            ],
            name,
        }
    }
}
