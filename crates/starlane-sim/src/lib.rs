//! Simulation engine for Starlane.
//!
//! Owns the hecs ECS world through `Level`, applies player actions, runs
//! entity updates at a fixed tick rate and emits the sequenced event stream
//! that keeps replicas in sync.

pub mod actions;
pub mod fleet;
pub mod generation;
pub mod level;
pub mod navigation;
pub mod pathfinding;
pub mod persistence;
pub mod progression;
pub mod random;
pub mod registry;
pub mod selectors;
pub mod star_system;
pub mod systems;
pub mod world_setup;

pub use level::{Level, LevelConfig, TickStats};
pub use starlane_core as core;
pub use star_system::StarSystem;
