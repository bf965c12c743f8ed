//! Snapshot documents: the serialized form of a level.
//!
//! A snapshot is sufficient to rebuild a level exactly. Event payloads reuse
//! these shapes so that replicas can apply them incrementally.

use std::collections::BTreeMap;

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::components::{Fleet, Projectile};
use crate::enums::{EntityKind, HardpointType, PlanetBiome, ResearchId, ShipType};
use crate::storage::Storage;
use crate::types::{EntityId, SystemId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub id: String,
    pub name: String,
    pub version: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub date: u64,
    pub difficulty: f64,
    pub systems: Vec<SystemSnapshot>,
    pub entities: Vec<EntitySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub id: SystemId,
    pub name: String,
    pub difficulty: f64,
    pub position: DVec2,
    pub connections: Vec<SystemConnection>,
}

/// A hyperspace link. Unknown link kinds are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemConnection {
    Known(KnownConnection),
    Other {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        value: serde_json::Value,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum KnownConnection {
    System(SystemId),
    Position(DVec2),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub name: String,
    pub system: SystemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityId>,
    pub position: DVec3,
    pub rotation: DVec3,
    pub velocity: DVec3,
    pub is_selected: bool,
    pub is_targetable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<DVec3>,
    #[serde(flatten)]
    pub data: EntityData,
}

impl EntitySnapshot {
    pub fn kind(&self) -> EntityKind {
        match self.data {
            EntityData::Star(_) => EntityKind::Star,
            EntityData::Planet(_) => EntityKind::Planet,
            EntityData::Hardpoint(_) => EntityKind::Hardpoint,
            EntityData::Ship(_) => EntityKind::Ship,
            EntityData::Player(_) => EntityKind::Player,
        }
    }
}

/// Type-specific fields, tagged by `entityType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entityType", rename_all = "snake_case")]
pub enum EntityData {
    Star(StarData),
    Planet(PlanetData),
    Hardpoint(HardpointData),
    Ship(ShipData),
    Player(PlayerData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarData {
    pub radius: f64,
    pub seed: f64,
    pub color: [f64; 3],
    pub fleet: Fleet,
    pub rewards: Storage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetData {
    pub radius: f64,
    pub seed: f64,
    pub biome: PlanetBiome,
    pub fleet: Fleet,
    pub rewards: Storage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardpointData {
    #[serde(rename = "type")]
    pub hardpoint_type: HardpointType,
    pub scale: f64,
    pub reload: u32,
    #[serde(default)]
    pub projectiles: Vec<Projectile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipData {
    #[serde(rename = "type")]
    pub ship_type: ShipType,
    pub hp: f64,
    pub jump_cooldown: u32,
    pub storage: Storage,
    pub hardpoints: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerData {
    pub fleet: Fleet,
    pub research: BTreeMap<ResearchId, u32>,
    pub xp: f64,
    pub xp_points: u32,
}
