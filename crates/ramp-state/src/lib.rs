//! ramp-state — domain types for the ramp autoscaling simulator.
//!
//! Holds the immutable [`ScalingConfig`], the per-tick [`SimulationState`],
//! instance records, the observer-facing [`Snapshot`]/[`AlertContext`]
//! types, and the one-way [`Observer`] trait.
//!
//! Nothing here persists: the container runtime is the sole source of
//! truth for instances and is re-queried every cycle, and simulation
//! state lives for exactly one process run.

pub mod config;
pub mod error;
pub mod observer;
pub mod types;

pub use config::ScalingConfig;
pub use error::{ConfigError, ConfigResult};
pub use observer::{NullObserver, Observer};
pub use types::*;
