//! Systems: named regions grouping entities, linked by hyperspace connections.
//!
//! A system owns no entities. Membership lives in the level's registry index.

use glam::DVec2;

use starlane_core::snapshot::{SystemConnection, SystemSnapshot};
use starlane_core::types::SystemId;

#[derive(Debug, Clone, PartialEq)]
pub struct StarSystem {
    pub id: SystemId,
    pub name: String,
    pub difficulty: f64,
    /// Position on the galaxy map, used for jump distances.
    pub position: DVec2,
    pub connections: Vec<SystemConnection>,
}

impl StarSystem {
    pub fn new(id: SystemId, name: impl Into<String>, position: DVec2) -> Self {
        Self {
            id,
            name: name.into(),
            difficulty: starlane_core::constants::MIN_SYSTEM_DIFFICULTY,
            position,
            connections: Vec::new(),
        }
    }

    /// Distance to another system on the galaxy map.
    pub fn distance_to(&self, other: &StarSystem) -> f64 {
        self.position.distance(other.position)
    }

    pub fn to_snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            difficulty: self.difficulty,
            position: self.position,
            connections: self.connections.clone(),
        }
    }

    pub fn from_snapshot(snapshot: SystemSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name,
            difficulty: snapshot.difficulty,
            position: snapshot.position,
            connections: snapshot.connections,
        }
    }
}

/// Difficulty of a system placed at `position`: grows with distance from the core.
pub fn difficulty_at(position: DVec2) -> f64 {
    (position.length().log10() - 1.0).max(starlane_core::constants::MIN_SYSTEM_DIFFICULTY)
}
