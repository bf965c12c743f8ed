//! Events emitted by the level for replication and presentation.
//!
//! The vocabulary is fixed. Payloads reuse snapshot shapes so that a replica
//! can rebuild state incrementally as long as no event is dropped.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::components::Fleet;
use crate::snapshot::EntitySnapshot;
use crate::storage::{ItemCollection, Storage};
use crate::types::{EntityId, SystemId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LevelEvent {
    EntityAdded {
        entity: EntitySnapshot,
    },
    EntityRemoved {
        entity: EntitySnapshot,
    },
    EntityDeath {
        entity: EntitySnapshot,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        killer: Option<EntityId>,
    },
    EntityPathStart {
        entity: EntityId,
        waypoints: Vec<DVec3>,
    },
    EntityJump {
        entity: EntityId,
        from: SystemId,
        to: SystemId,
    },
    FleetItemsChange {
        owner: EntityId,
        fleet: Fleet,
        items: ItemCollection,
        /// Per-ship storage after the change.
        #[serde(default)]
        holdings: Vec<ShipHolding>,
    },
    ProjectileFire {
        hardpoint: EntityId,
        target: EntityId,
        projectile: EntityId,
        position: DVec3,
        velocity: DVec3,
        ticks: u32,
        #[serde(default)]
        damage: f64,
        #[serde(default)]
        critical: bool,
    },
    /// A projectile landed. `hp` is the ship's hull after the hit.
    EntityHit {
        entity: EntityId,
        hardpoint: EntityId,
        damage: f64,
        hp: f64,
    },
    /// Research or xp changed without a level up.
    PlayerUpdate {
        player: EntitySnapshot,
    },
    RewardsChange {
        owner: EntityId,
        rewards: Storage,
    },
    PlayerLevelup {
        player: EntitySnapshot,
    },
    PlayerReset {
        player: EntitySnapshot,
    },
    /// Tick heartbeat.
    Update {
        tick: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipHolding {
    pub ship: EntityId,
    pub storage: Storage,
}

/// An event stamped with its position in the level's event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencedEvent {
    pub seq: u64,
    pub tick: u64,
    #[serde(flatten)]
    pub event: LevelEvent,
}
