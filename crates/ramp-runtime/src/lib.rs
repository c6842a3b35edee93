//! ramp-runtime — container lifecycle primitives behind a trait.
//!
//! The control loop consumes [`ContainerRuntime`] and never talks to a
//! concrete runtime directly. Two implementations ship:
//!
//! - [`DockerRuntime`] drives the local `docker` CLI via subprocesses
//!   and parses its JSON listing output.
//! - [`MemoryRuntime`] keeps the instance set in memory, for tests and
//!   `--dry-run` where no Docker daemon is available.

pub mod adapter;
pub mod docker;
pub mod error;
pub mod memory;

pub use adapter::{ContainerRuntime, InstanceSpec};
pub use docker::DockerRuntime;
pub use error::{RuntimeError, RuntimeResult};
pub use memory::MemoryRuntime;
