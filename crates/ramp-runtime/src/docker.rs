//! Docker CLI adapter.
//!
//! Shells out to the `docker` binary rather than speaking the engine
//! API directly; every operation is one subprocess with captured
//! stdout/stderr. Listing uses `docker ps --format '{{json .}}'`, one
//! JSON object per line.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, trace};

use ramp_state::{Instance, InstanceId};

use crate::adapter::{ContainerRuntime, InstanceSpec};
use crate::error::{RuntimeError, RuntimeResult};

/// One line of `docker ps --format '{{json .}}'` output.
#[derive(Debug, Deserialize)]
struct PsLine {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Names")]
    names: String,
    #[serde(rename = "Labels")]
    labels: String,
    #[serde(rename = "Ports", default)]
    ports: String,
}

/// [`ContainerRuntime`] backed by the local `docker` CLI.
pub struct DockerRuntime {
    docker_bin: String,
}

impl DockerRuntime {
    /// Adapter over the `docker` binary found on `PATH`.
    pub fn new() -> Self {
        Self::with_binary("docker")
    }

    /// Adapter over an explicit binary (e.g. `podman`, a test shim).
    pub fn with_binary(bin: impl Into<String>) -> Self {
        Self {
            docker_bin: bin.into(),
        }
    }

    /// Run one CLI invocation and return trimmed stdout.
    async fn run(&self, args: &[&str]) -> RuntimeResult<String> {
        trace!(bin = %self.docker_bin, args = ?args, "exec");
        let output = Command::new(&self.docker_bin).args(args).output().await?;
        if !output.status.success() {
            return Err(RuntimeError::CommandFailed {
                command: format!("{} {}", self.docker_bin, args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn list_inner(&self, group: &str, all: bool) -> RuntimeResult<Vec<Instance>> {
        let filter = format!("label=app={group}");
        let mut args = vec!["ps", "--filter", &filter, "--format", "{{json .}}"];
        if all {
            args.insert(1, "-a");
        }
        let stdout = self.run(&args).await?;

        let mut instances = Vec::new();
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            let ps: PsLine = serde_json::from_str(line)
                .map_err(|e| RuntimeError::Parse(format!("ps line {line:?}: {e}")))?;
            instances.push(Instance {
                id: short_id(&ps.id),
                name: ps.names.trim_start_matches('/').to_string(),
                port: parse_host_port(&ps.ports),
                sequence: parse_sequence_label(&ps.labels),
            });
        }
        instances.sort_by_key(|i| i.sequence);
        Ok(instances)
    }
}

impl Default for DockerRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list(&self, group: &str) -> RuntimeResult<Vec<Instance>> {
        self.list_inner(group, false).await
    }

    async fn list_all(&self, group: &str) -> RuntimeResult<Vec<Instance>> {
        self.list_inner(group, true).await
    }

    async fn create(&self, spec: &InstanceSpec) -> RuntimeResult<Instance> {
        let app_label = format!("app={}", spec.group);
        let seq_label = format!("instance={}", spec.sequence);
        let publish = format!("0:{}", spec.container_port);
        let memory = format!("{}g", spec.memory_limit_gb);
        let cpus = spec.cpu_limit.to_string();

        let mut args: Vec<String> = vec![
            "run".into(),
            "-d".into(),
            "--name".into(),
            spec.name.clone(),
            "--label".into(),
            app_label,
            "--label".into(),
            seq_label,
            "-p".into(),
            publish,
            "--memory".into(),
            memory,
            "--cpus".into(),
            cpus,
            "--restart".into(),
            "unless-stopped".into(),
        ];
        for (key, value) in &spec.env {
            args.push("-e".into());
            args.push(format!("{key}={value}"));
        }
        args.push(spec.image.clone());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let container_id = self.run(&arg_refs).await?;
        let id = short_id(&container_id);

        // Host port lookup is best-effort: a missing mapping degrades
        // the dashboard, not the scaling logic.
        let port_query = format!("{}/tcp", spec.container_port);
        let port = match self.run(&["port", &spec.name, &port_query]).await {
            Ok(out) => out.lines().next().and_then(|l| {
                l.rsplit(':').next().and_then(|p| p.parse::<u16>().ok())
            }),
            Err(e) => {
                debug!(name = %spec.name, error = %e, "host port lookup failed");
                None
            }
        };

        debug!(name = %spec.name, %id, ?port, "container created");
        Ok(Instance {
            id,
            name: spec.name.clone(),
            port,
            sequence: spec.sequence,
        })
    }

    async fn stop(&self, id: &InstanceId, timeout: Duration) -> RuntimeResult<()> {
        let grace_secs = timeout.as_secs().max(1);
        let grace = grace_secs.to_string();
        // `docker stop -t` enforces the graceful window itself; the
        // outer deadline bounds a wedged CLI or daemon.
        let deadline = timeout + Duration::from_secs(5);
        match tokio::time::timeout(deadline, self.run(&["stop", "-t", &grace, id])).await {
            Ok(result) => result.map(|_| ()),
            Err(_) => Err(RuntimeError::StopTimeout {
                id: id.clone(),
                secs: deadline.as_secs(),
            }),
        }
    }

    async fn remove(&self, id: &InstanceId) -> RuntimeResult<()> {
        self.run(&["rm", id]).await.map(|_| ())
    }

    async fn image_exists(&self, image: &str) -> RuntimeResult<bool> {
        match self.run(&["image", "inspect", image]).await {
            Ok(_) => Ok(true),
            Err(RuntimeError::CommandFailed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Docker convention: the first 12 hex chars identify a container.
fn short_id(id: &str) -> InstanceId {
    id.chars().take(12).collect()
}

/// Pull the `instance=N` sequence out of a comma-joined label string.
/// Unlabeled containers sort first so foreign leftovers drain earliest.
fn parse_sequence_label(labels: &str) -> u32 {
    labels
        .split(',')
        .find_map(|l| l.trim().strip_prefix("instance="))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Parse the host port from a mapping like `0.0.0.0:55001->3000/tcp`.
fn parse_host_port(ports: &str) -> Option<u16> {
    ports
        .split(',')
        .filter_map(|mapping| mapping.split_once("->"))
        .find_map(|(host, _)| host.rsplit(':').next().and_then(|p| p.trim().parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_truncates_to_twelve() {
        assert_eq!(
            short_id("4a5bc9e0f1d2aabbccddeeff0011"),
            "4a5bc9e0f1d2".to_string()
        );
        assert_eq!(short_id("abc"), "abc".to_string());
    }

    #[test]
    fn sequence_label_parsed_from_label_list() {
        assert_eq!(parse_sequence_label("app=test-app,instance=3"), 3);
        assert_eq!(parse_sequence_label("instance=12,app=test-app"), 12);
        assert_eq!(parse_sequence_label("app=test-app"), 0);
        assert_eq!(parse_sequence_label(""), 0);
    }

    #[test]
    fn host_port_parsed_from_mapping() {
        assert_eq!(parse_host_port("0.0.0.0:55001->3000/tcp"), Some(55001));
        assert_eq!(
            parse_host_port("0.0.0.0:49153->3000/tcp, :::49153->3000/tcp"),
            Some(49153)
        );
        assert_eq!(parse_host_port(""), None);
        assert_eq!(parse_host_port("3000/tcp"), None);
    }

    #[test]
    fn ps_line_deserializes() {
        let line = r#"{"ID":"4a5bc9e0f1d2","Names":"test-app-17-442","Labels":"app=test-app,instance=2","Ports":"0.0.0.0:55001->3000/tcp"}"#;
        let ps: PsLine = serde_json::from_str(line).unwrap();
        assert_eq!(ps.id, "4a5bc9e0f1d2");
        assert_eq!(ps.names, "test-app-17-442");
        assert_eq!(parse_sequence_label(&ps.labels), 2);
        assert_eq!(parse_host_port(&ps.ports), Some(55001));
    }

    #[test]
    fn ps_line_tolerates_missing_ports() {
        let line = r#"{"ID":"4a5bc9e0f1d2","Names":"x","Labels":"app=test-app"}"#;
        let ps: PsLine = serde_json::from_str(line).unwrap();
        assert_eq!(parse_host_port(&ps.ports), None);
    }
}
