//! ramp-dashboard — console rendering of control-loop state.
//!
//! Strictly one-way: the dashboard receives [`Snapshot`]s and alert
//! context through the [`Observer`] trait and paints the terminal.
//! Nothing here feeds back into scaling decisions.

pub mod render;

pub use render::ConsoleDashboard;
