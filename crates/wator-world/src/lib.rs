//! Wa-Tor world engine.
//!
//! This module implements the toroidal ocean where fish and sharks move, breed,
//! and starve, one chronon at a time, optionally spread over several worker
//! threads.

pub mod adjacency;
pub mod creature;
pub mod engine;
pub mod grid;
pub mod scheduler;
pub mod simulation;
pub mod snapshot;

pub use adjacency::{neighbors, Neighbors};
pub use creature::Creature;
pub use engine::{ChrononStats, Rules};
pub use grid::{Cell, Grid};
pub use scheduler::Scheduler;
pub use simulation::{RunSummary, Simulation};
pub use snapshot::{CreatureView, Snapshot};
