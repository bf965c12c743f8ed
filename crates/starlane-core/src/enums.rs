//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Concrete kind of a simulated entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Star,
    Planet,
    Hardpoint,
    Ship,
    Player,
}

impl EntityKind {
    /// Snapshot load priority. Lower loads first; later kinds reference earlier ones.
    pub fn load_priority(self) -> u8 {
        match self {
            EntityKind::Star => 0,
            EntityKind::Planet => 1,
            EntityKind::Hardpoint => 2,
            EntityKind::Ship => 3,
            EntityKind::Player => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Star => "star",
            EntityKind::Planet => "planet",
            EntityKind::Hardpoint => "hardpoint",
            EntityKind::Ship => "ship",
            EntityKind::Player => "player",
        }
    }

    pub fn is_celestial_body(self) -> bool {
        matches!(self, EntityKind::Star | EntityKind::Planet)
    }
}

/// Ship catalog keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipType {
    Wind,
    Mosquito,
    Cillus,
    Inca,
    Pilsung,
    Apis,
    Hurricane,
    Horizon,
}

impl ShipType {
    pub const ALL: [ShipType; 8] = [
        ShipType::Wind,
        ShipType::Mosquito,
        ShipType::Cillus,
        ShipType::Inca,
        ShipType::Pilsung,
        ShipType::Apis,
        ShipType::Hurricane,
        ShipType::Horizon,
    ];
}

/// Weapon archetypes that can be mounted on a ship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardpointType {
    #[default]
    LaserCannonDouble,
}

/// Projectile visuals carried by a weapon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    #[default]
    Laser,
}

/// Item catalog keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemId {
    Metal,
    Minerals,
    Fuel,
    AncientTech,
    CodeSnippets,
}

impl ItemId {
    pub const ALL: [ItemId; 5] = [
        ItemId::Metal,
        ItemId::Minerals,
        ItemId::Fuel,
        ItemId::AncientTech,
        ItemId::CodeSnippets,
    ];
}

/// Research (tech tree) keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchId {
    Armor,
    Laser,
    Reload,
    Thrust,
    Energy,
    Shields,
    Storage,
    Missle,
    Regen,
    Build,
    Salvage,
}

impl ResearchId {
    pub const ALL: [ResearchId; 11] = [
        ResearchId::Armor,
        ResearchId::Laser,
        ResearchId::Reload,
        ResearchId::Thrust,
        ResearchId::Energy,
        ResearchId::Shields,
        ResearchId::Storage,
        ResearchId::Missle,
        ResearchId::Regen,
        ResearchId::Build,
        ResearchId::Salvage,
    ];
}

/// Planet surface style, used by renderers for material generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanetBiome {
    #[default]
    Earthlike,
    Volcanic,
    Jungle,
    Ice,
    Desert,
    Moon,
    Islands,
}

impl PlanetBiome {
    pub const ALL: [PlanetBiome; 7] = [
        PlanetBiome::Earthlike,
        PlanetBiome::Volcanic,
        PlanetBiome::Jungle,
        PlanetBiome::Ice,
        PlanetBiome::Desert,
        PlanetBiome::Moon,
        PlanetBiome::Islands,
    ];
}

/// Level lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelState {
    #[default]
    Idle,
    Running,
    Stopping,
    Stopped,
}
