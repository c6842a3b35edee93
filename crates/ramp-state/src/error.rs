//! Error types for configuration validation.

use thiserror::Error;

/// Result type alias for config validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced by [`crate::ScalingConfig::validate`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("min_replicas ({min}) exceeds max_replicas ({max})")]
    ReplicaBoundsInverted { min: u32, max: u32 },

    #[error("demand_floor ({floor}) exceeds demand_ceiling ({ceiling})")]
    DemandBoundsInverted { floor: u32, ceiling: u32 },

    #[error("per_replica_capacity must be non-zero")]
    ZeroCapacity,

    #[error("demand_increment must be non-zero")]
    ZeroIncrement,

    #[error("min_replicas must be at least 1")]
    ZeroMinReplicas,
}
