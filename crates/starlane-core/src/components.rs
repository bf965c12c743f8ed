//! ECS components for hecs entities.
//!
//! Components are plain data structs with no methods.
//! Game logic lives in the simulation crate, not here.

use std::collections::{BTreeMap, VecDeque};

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::storage::Storage;
use crate::types::{EntityId, SystemId};

/// Identity shared by every entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
}

/// Local transform. Absolute position adds the parent chain's positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: DVec3,
    pub rotation: DVec3,
    pub velocity: DVec3,
}

/// The system an entity lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub system: SystemId,
}

/// Gameplay ownership and transform parent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relations {
    pub owner: Option<EntityId>,
    pub parent: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFlags {
    pub is_targetable: bool,
    pub is_obstacle: bool,
    pub is_selected: bool,
    pub is_saveable: bool,
}

impl Default for EntityFlags {
    fn default() -> Self {
        Self {
            is_targetable: false,
            is_obstacle: false,
            is_selected: false,
            is_saveable: true,
        }
    }
}

/// Remaining waypoints of an active path, head first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathQueue {
    pub waypoints: VecDeque<DVec3>,
}

/// Ships owned by a player or celestial body, anchored at `position`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fleet {
    pub position: DVec3,
    pub ships: Vec<EntityId>,
}

/// Shared data of stars and planets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialBody {
    pub radius: f64,
    pub seed: f64,
    /// Loot collected when the body's fleet destroys ships.
    pub rewards: Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StarColor(pub [f64; 3]);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanetSurface {
    pub biome: PlanetBiome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipState {
    pub ship_type: ShipType,
    pub hp: f64,
    /// Ticks until the next hyperspace jump is allowed.
    pub jump_cooldown: u32,
    pub storage: Storage,
    /// Mounted weapons, in slot order.
    pub hardpoints: Vec<EntityId>,
}

/// A projectile in flight, resolved analytically on arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub target: EntityId,
    pub position: DVec3,
    pub velocity: DVec3,
    pub ticks_remaining: u32,
    pub damage: f64,
    pub critical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardpointState {
    pub hardpoint_type: HardpointType,
    pub scale: f64,
    /// Ticks until the weapon can fire.
    pub reload: u32,
    pub projectiles: Vec<Projectile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub research: BTreeMap<ResearchId, u32>,
    pub xp: f64,
    /// Unspent level-up points.
    pub xp_points: u32,
}
