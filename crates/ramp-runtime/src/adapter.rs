//! The runtime adapter trait consumed by the control loop.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ramp_state::{Instance, InstanceId};

use crate::error::RuntimeResult;

/// Everything needed to create one workload instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstanceSpec {
    /// Container image to run.
    pub image: String,
    /// Unique container name.
    pub name: String,
    /// Scaling group — written as the `app` label.
    pub group: String,
    /// Creation order index — written as the `instance` label.
    pub sequence: u32,
    /// Port the workload listens on; published to an ephemeral host port.
    pub container_port: u16,
    /// CPU limit (fractional cores).
    pub cpu_limit: f64,
    /// Memory limit in GB.
    pub memory_limit_gb: f64,
    /// Environment variables injected into the container.
    pub env: Vec<(String, String)>,
}

/// Container lifecycle primitives.
///
/// The runtime is the sole source of truth for the actual instance set;
/// callers re-query every cycle rather than caching.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List running instances in the scaling group, ordered by sequence.
    async fn list(&self, group: &str) -> RuntimeResult<Vec<Instance>>;

    /// List all instances in the group, including stopped ones.
    /// Used by drain, which must sweep up non-running leftovers too.
    async fn list_all(&self, group: &str) -> RuntimeResult<Vec<Instance>>;

    /// Create and start one instance. The runtime assigns the host port.
    async fn create(&self, spec: &InstanceSpec) -> RuntimeResult<Instance>;

    /// Best-effort graceful stop with a bounded timeout.
    async fn stop(&self, id: &InstanceId, timeout: Duration) -> RuntimeResult<()>;

    /// Delete the instance record.
    async fn remove(&self, id: &InstanceId) -> RuntimeResult<()>;

    /// Whether the workload image is present on this host.
    async fn image_exists(&self, image: &str) -> RuntimeResult<bool>;
}
