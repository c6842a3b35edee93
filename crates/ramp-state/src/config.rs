//! Scaling configuration — set once at startup, immutable afterwards.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Immutable configuration for a simulation run.
///
/// Defaults mirror the reference scenario: demand climbs from 0 to 2000
/// in steps of 100 per second, one replica serves 500 users, the fleet
/// is bounded to 1..=4 replicas, and the saturation alert pauses the
/// ramp for 30 seconds before the descent to 400.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalingConfig {
    /// Scaling group name — also the value of the `app` label on every
    /// container this simulator owns.
    pub app_name: String,
    /// Container image for workload instances.
    pub image: String,
    /// Port the workload listens on inside the container.
    pub container_port: u16,

    /// Users one replica can serve.
    pub per_replica_capacity: u32,
    /// Lower bound on the replica count.
    pub min_replicas: u32,
    /// Upper bound on the replica count.
    pub max_replicas: u32,

    /// Demand level at which the ramp tops out and the alert fires.
    pub demand_ceiling: u32,
    /// Demand level at which the descending ramp stops the simulation.
    pub demand_floor: u32,
    /// Demand delta applied once per tick.
    pub demand_increment: u32,

    /// How long the saturation alert pauses the ramp.
    pub alert_pause: Duration,
    /// Interval between control-loop ticks.
    pub tick_interval: Duration,
    /// Delay between consecutive instance creations within one cycle.
    pub creation_stagger: Duration,
    /// Graceful stop timeout during scale-down.
    pub stop_timeout: Duration,
    /// Graceful stop timeout during drain (shutdown path).
    pub drain_stop_timeout: Duration,

    /// CPU limit per container (fractional cores).
    pub container_cpu: f64,
    /// Memory limit per container in GB.
    pub container_memory_gb: f64,
    /// Total CPU of the simulated host, for dashboard usage bars.
    pub server_total_cpu: f64,
    /// Total RAM of the simulated host in GB, for dashboard usage bars.
    pub server_total_ram_gb: f64,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            app_name: "test-app".to_string(),
            image: "test-app:latest".to_string(),
            container_port: 3000,
            per_replica_capacity: 500,
            min_replicas: 1,
            max_replicas: 4,
            demand_ceiling: 2000,
            demand_floor: 400,
            demand_increment: 100,
            alert_pause: Duration::from_secs(30),
            tick_interval: Duration::from_secs(1),
            creation_stagger: Duration::from_millis(300),
            stop_timeout: Duration::from_secs(10),
            drain_stop_timeout: Duration::from_secs(5),
            container_cpu: 0.8,
            container_memory_gb: 1.0,
            server_total_cpu: 4.0,
            server_total_ram_gb: 16.0,
        }
    }
}

impl ScalingConfig {
    /// Check internal consistency. Called once at startup.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.per_replica_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.demand_increment == 0 {
            return Err(ConfigError::ZeroIncrement);
        }
        if self.min_replicas == 0 {
            return Err(ConfigError::ZeroMinReplicas);
        }
        if self.min_replicas > self.max_replicas {
            return Err(ConfigError::ReplicaBoundsInverted {
                min: self.min_replicas,
                max: self.max_replicas,
            });
        }
        if self.demand_floor > self.demand_ceiling {
            return Err(ConfigError::DemandBoundsInverted {
                floor: self.demand_floor,
                ceiling: self.demand_ceiling,
            });
        }
        Ok(())
    }

    /// The most demand the fleet can serve at `max_replicas`.
    ///
    /// Beyond this point scale-up is pointless (desired is already
    /// clamped to max); excess demand is surfaced via the alert only.
    pub fn max_servable_capacity(&self) -> u32 {
        self.per_replica_capacity * self.max_replicas
    }
}
