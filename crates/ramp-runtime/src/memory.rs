//! In-memory runtime twin.
//!
//! Implements [`ContainerRuntime`] over a mutex-guarded instance table.
//! Used by the test suite and by `--dry-run`, where the full scenario
//! runs without a Docker daemon. Supports injecting a one-shot listing
//! failure to exercise the degrade-to-empty reconciliation path.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use ramp_state::{Instance, InstanceId};

use crate::adapter::{ContainerRuntime, InstanceSpec};
use crate::error::{RuntimeError, RuntimeResult};

#[derive(Debug, Clone)]
struct MemInstance {
    instance: Instance,
    group: String,
    running: bool,
}

#[derive(Debug, Default)]
struct Inner {
    instances: Vec<MemInstance>,
    next_port: u16,
    next_id: u64,
    fail_next_list: bool,
    created_total: u64,
}

/// [`ContainerRuntime`] with no runtime behind it.
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    inner: Mutex<Inner>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `list`/`list_all` call fail, then recover.
    pub fn fail_next_list(&self) {
        self.lock().fail_next_list = true;
    }

    /// Number of instances currently running.
    pub fn running_count(&self) -> usize {
        self.lock().instances.iter().filter(|i| i.running).count()
    }

    /// Number of instance records, running or not.
    pub fn total_count(&self) -> usize {
        self.lock().instances.len()
    }

    /// Total creations over the lifetime of this runtime.
    pub fn created_total(&self) -> u64 {
        self.lock().created_total
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn group_instances(&self, group: &str, include_stopped: bool) -> Vec<Instance> {
        let mut instances: Vec<Instance> = self
            .lock()
            .instances
            .iter()
            .filter(|i| i.group == group && (include_stopped || i.running))
            .map(|i| i.instance.clone())
            .collect();
        instances.sort_by_key(|i| i.sequence);
        instances
    }

    fn take_list_failure(&self) -> bool {
        let mut inner = self.lock();
        std::mem::take(&mut inner.fail_next_list)
    }
}

#[async_trait]
impl ContainerRuntime for MemoryRuntime {
    async fn list(&self, group: &str) -> RuntimeResult<Vec<Instance>> {
        if self.take_list_failure() {
            return Err(RuntimeError::CommandFailed {
                command: "list".to_string(),
                stderr: "injected listing failure".to_string(),
            });
        }
        Ok(self.group_instances(group, false))
    }

    async fn list_all(&self, group: &str) -> RuntimeResult<Vec<Instance>> {
        if self.take_list_failure() {
            return Err(RuntimeError::CommandFailed {
                command: "list_all".to_string(),
                stderr: "injected listing failure".to_string(),
            });
        }
        Ok(self.group_instances(group, true))
    }

    async fn create(&self, spec: &InstanceSpec) -> RuntimeResult<Instance> {
        let mut inner = self.lock();
        inner.next_id += 1;
        inner.next_port += 1;
        inner.created_total += 1;
        let instance = Instance {
            id: format!("mem-{:08x}", inner.next_id),
            name: spec.name.clone(),
            port: Some(55000 + inner.next_port),
            sequence: spec.sequence,
        };
        inner.instances.push(MemInstance {
            instance: instance.clone(),
            group: spec.group.clone(),
            running: true,
        });
        debug!(name = %spec.name, id = %instance.id, "memory instance created");
        Ok(instance)
    }

    async fn stop(&self, id: &InstanceId, _timeout: Duration) -> RuntimeResult<()> {
        let mut inner = self.lock();
        match inner.instances.iter_mut().find(|i| i.instance.id == *id) {
            Some(i) => {
                i.running = false;
                Ok(())
            }
            None => Err(RuntimeError::CommandFailed {
                command: format!("stop {id}"),
                stderr: "no such instance".to_string(),
            }),
        }
    }

    async fn remove(&self, id: &InstanceId) -> RuntimeResult<()> {
        let mut inner = self.lock();
        let before = inner.instances.len();
        inner.instances.retain(|i| i.instance.id != *id);
        if inner.instances.len() == before {
            return Err(RuntimeError::CommandFailed {
                command: format!("rm {id}"),
                stderr: "no such instance".to_string(),
            });
        }
        Ok(())
    }

    async fn image_exists(&self, _image: &str) -> RuntimeResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(sequence: u32) -> InstanceSpec {
        InstanceSpec {
            image: "test-app:latest".to_string(),
            name: format!("test-app-{sequence}"),
            group: "test-app".to_string(),
            sequence,
            container_port: 3000,
            cpu_limit: 0.8,
            memory_limit_gb: 1.0,
            env: vec![],
        }
    }

    #[tokio::test]
    async fn create_then_list_sorted_by_sequence() {
        let rt = MemoryRuntime::new();
        rt.create(&spec(2)).await.unwrap();
        rt.create(&spec(1)).await.unwrap();

        let listed = rt.list("test-app").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].sequence, 1);
        assert_eq!(listed[1].sequence, 2);
    }

    #[tokio::test]
    async fn stopped_instances_excluded_from_list_but_not_list_all() {
        let rt = MemoryRuntime::new();
        let a = rt.create(&spec(1)).await.unwrap();
        rt.create(&spec(2)).await.unwrap();

        rt.stop(&a.id, Duration::from_secs(1)).await.unwrap();

        assert_eq!(rt.list("test-app").await.unwrap().len(), 1);
        assert_eq!(rt.list_all("test-app").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn injected_list_failure_is_one_shot() {
        let rt = MemoryRuntime::new();
        rt.create(&spec(1)).await.unwrap();

        rt.fail_next_list();
        assert!(rt.list("test-app").await.is_err());
        assert_eq!(rt.list("test-app").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn remove_unknown_instance_fails() {
        let rt = MemoryRuntime::new();
        let result = rt.remove(&"mem-missing".to_string()).await;
        assert!(matches!(result, Err(RuntimeError::CommandFailed { .. })));
    }

    #[tokio::test]
    async fn groups_are_isolated() {
        let rt = MemoryRuntime::new();
        rt.create(&spec(1)).await.unwrap();
        let mut other = spec(1);
        other.group = "other-app".to_string();
        rt.create(&other).await.unwrap();

        assert_eq!(rt.list("test-app").await.unwrap().len(), 1);
        assert_eq!(rt.list("other-app").await.unwrap().len(), 1);
    }
}
