//! Static game data: ships, weapons, items, research and naming tables.

use glam::DVec3;

use crate::constants::{TICK_RATE, XP_PER_LEVEL_FACTOR};
use crate::enums::{HardpointType, ItemId, ProjectileKind, ResearchId, ShipType};
use crate::storage::{collect_items, scale_items, ItemCollection};

// --- Items ---

#[derive(Debug, Clone, Copy)]
pub struct ItemSpec {
    pub id: ItemId,
    pub rare: bool,
    pub value: f64,
    pub weight: f64,
    /// Materials consumed to craft one unit. `None` means the item cannot be crafted.
    pub recipe: Option<&'static [(ItemId, f64)]>,
}

pub fn item_spec(id: ItemId) -> ItemSpec {
    match id {
        ItemId::Metal => ItemSpec {
            id,
            rare: false,
            value: 1.0,
            weight: 1.0,
            recipe: None,
        },
        ItemId::Minerals => ItemSpec {
            id,
            rare: false,
            value: 2.0,
            weight: 0.5,
            recipe: None,
        },
        ItemId::Fuel => ItemSpec {
            id,
            rare: false,
            value: 4.0,
            weight: 1.0,
            recipe: Some(&[(ItemId::Minerals, 2.0)]),
        },
        ItemId::AncientTech => ItemSpec {
            id,
            rare: true,
            value: 1000.0,
            weight: 1.0,
            recipe: None,
        },
        ItemId::CodeSnippets => ItemSpec {
            id,
            rare: true,
            value: 1000.0,
            weight: 1.0,
            recipe: None,
        },
    }
}

// --- Hardpoints ---

#[derive(Debug, Clone, Copy)]
pub struct ProjectileSpec {
    pub kind: ProjectileKind,
    pub count: u32,
    /// Distance travelled per tick.
    pub speed: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct HardpointSpec {
    pub hardpoint_type: HardpointType,
    pub damage: f64,
    /// Ticks between shots.
    pub reload: u32,
    pub range: f64,
    pub crit_chance: f64,
    pub crit_factor: f64,
    /// Higher accuracy narrows the aim spread (spread radius = 1 / accuracy).
    pub accuracy: f64,
    pub projectile: ProjectileSpec,
}

pub fn hardpoint_spec(hardpoint_type: HardpointType) -> HardpointSpec {
    match hardpoint_type {
        HardpointType::LaserCannonDouble => HardpointSpec {
            hardpoint_type,
            damage: 1.0,
            reload: 60,
            range: 200.0,
            crit_chance: 0.05,
            crit_factor: 1.5,
            accuracy: 0.5,
            projectile: ProjectileSpec {
                kind: ProjectileKind::Laser,
                count: 1,
                speed: 50.0,
            },
        },
    }
}

/// A weapon mount on a ship model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HardpointSlot {
    pub hardpoint_type: HardpointType,
    /// Offset from the ship origin.
    pub position: DVec3,
    pub rotation: DVec3,
    pub scale: f64,
}

// --- Ships ---

#[derive(Debug, Clone, Copy)]
pub struct ShipSpec {
    pub ship_type: ShipType,
    pub hp: f64,
    pub speed: f64,
    pub agility: f64,
    pub jump_range: f64,
    /// Ticks before another jump is possible.
    pub jump_cooldown: u32,
    pub power: f64,
    /// Whether generated (hostile) fleets may contain this ship.
    pub enemy: bool,
    /// Experience awarded for destroying this ship.
    pub xp: f64,
    pub storage: f64,
    pub recipe: &'static [(ItemId, f64)],
    pub requires: &'static [(ResearchId, u32)],
}

const fn secs(seconds: u32) -> u32 {
    seconds * TICK_RATE
}

pub fn ship_spec(ship_type: ShipType) -> ShipSpec {
    use ItemId::{Fuel, Metal, Minerals};
    match ship_type {
        ShipType::Wind => ShipSpec {
            ship_type,
            hp: 10.0,
            speed: 2.0,
            agility: 2.0,
            jump_range: 10_000.0,
            jump_cooldown: secs(30),
            power: 1.0,
            enemy: true,
            xp: 5.0,
            storage: 100.0,
            recipe: &[(Metal, 1000.0), (Minerals, 500.0), (Fuel, 250.0)],
            requires: &[],
        },
        ShipType::Mosquito => ShipSpec {
            ship_type,
            hp: 25.0,
            speed: 1.0,
            agility: 1.5,
            jump_range: 10_000.0,
            jump_cooldown: secs(40),
            power: 2.0,
            enemy: true,
            xp: 7.5,
            storage: 250.0,
            recipe: &[(Metal, 2000.0), (Minerals, 2000.0), (Fuel, 500.0)],
            requires: &[],
        },
        ShipType::Cillus => ShipSpec {
            ship_type,
            hp: 5.0,
            speed: 1.0,
            agility: 0.75,
            jump_range: 10_000.0,
            jump_cooldown: secs(50),
            power: 1.0,
            enemy: false,
            xp: 10.0,
            storage: 25_000.0,
            recipe: &[(Metal, 5000.0), (Minerals, 1000.0), (Fuel, 2500.0)],
            requires: &[(ResearchId::Storage, 3)],
        },
        ShipType::Inca => ShipSpec {
            ship_type,
            hp: 50.0,
            speed: 1.0,
            agility: 1.0,
            jump_range: 10_000.0,
            jump_cooldown: secs(45),
            power: 5.0,
            enemy: true,
            xp: 10.0,
            storage: 250.0,
            recipe: &[(Metal, 4000.0), (Minerals, 1000.0), (Fuel, 1000.0)],
            requires: &[],
        },
        ShipType::Pilsung => ShipSpec {
            ship_type,
            hp: 100.0,
            speed: 1.0,
            agility: 1.0,
            jump_range: 10_000.0,
            jump_cooldown: secs(45),
            power: 10.0,
            enemy: true,
            xp: 20.0,
            storage: 1000.0,
            recipe: &[(Metal, 10_000.0), (Minerals, 4000.0), (Fuel, 2500.0)],
            requires: &[],
        },
        ShipType::Apis => ShipSpec {
            ship_type,
            hp: 50.0,
            speed: 2.0 / 3.0,
            agility: 0.5,
            jump_range: 10_000.0,
            jump_cooldown: secs(60),
            power: 10.0,
            enemy: false,
            xp: 10.0,
            storage: 100_000.0,
            recipe: &[(Metal, 10_000.0), (Minerals, 2000.0), (Fuel, 5000.0)],
            requires: &[(ResearchId::Storage, 5)],
        },
        ShipType::Hurricane => ShipSpec {
            ship_type,
            hp: 250.0,
            speed: 2.0 / 3.0,
            agility: 1.0,
            jump_range: 10_000.0,
            jump_cooldown: secs(45),
            power: 25.0,
            enemy: true,
            xp: 50.0,
            storage: 2500.0,
            recipe: &[(Metal, 25_000.0), (Minerals, 10_000.0), (Fuel, 5000.0)],
            requires: &[],
        },
        ShipType::Horizon => ShipSpec {
            ship_type,
            hp: 2000.0,
            speed: 1.0 / 3.0,
            agility: 1.0,
            jump_range: 10_000.0,
            jump_cooldown: secs(60),
            power: 100.0,
            enemy: true,
            xp: 100.0,
            storage: 10_000.0,
            recipe: &[
                (Metal, 1_000_000.0),
                (Minerals, 500_000.0),
                (Fuel, 250_000.0),
            ],
            requires: &[(ResearchId::Build, 5)],
        },
    }
}

pub fn ship_recipe(ship_type: ShipType) -> ItemCollection {
    collect_items(ship_spec(ship_type).recipe)
}

/// Greedy enemy fleet composition: strongest ship types first, as many as the
/// remaining power allows.
pub fn fleet_for_power(power: f64) -> Vec<ShipType> {
    let mut specs: Vec<ShipSpec> = ShipType::ALL
        .into_iter()
        .map(ship_spec)
        .filter(|spec| spec.enemy && spec.power > 0.0)
        .collect();
    specs.sort_by(|a, b| b.power.total_cmp(&a.power));

    let mut remaining = power;
    let mut fleet = Vec::new();
    for spec in specs {
        let count = (remaining / spec.power).floor().max(0.0) as usize;
        fleet.extend(std::iter::repeat(spec.ship_type).take(count));
        remaining -= spec.power * count as f64;
    }
    fleet
}

fn laser(x: f64, y: f64, z: f64, yaw: f64, scale: f64) -> HardpointSlot {
    HardpointSlot {
        hardpoint_type: HardpointType::LaserCannonDouble,
        position: DVec3::new(x, y, z),
        rotation: DVec3::new(0.0, yaw, 0.0),
        scale,
    }
}

/// Weapon mounts for a ship model, in slot order.
pub fn hardpoint_slots(ship_type: ShipType) -> Vec<HardpointSlot> {
    use std::f64::consts::FRAC_PI_2 as RIGHT;
    match ship_type {
        ShipType::Wind => vec![laser(0.0, 0.01, 0.05, 0.0, 0.25)],
        ShipType::Mosquito => vec![
            laser(-0.025, 0.0075, -0.075, 0.0, 0.375),
            laser(0.025, 0.0075, -0.075, 0.0, 0.375),
        ],
        ShipType::Cillus | ShipType::Apis => Vec::new(),
        ShipType::Inca => vec![
            laser(-0.06, 0.03, -0.1, 0.0, 0.75),
            laser(0.06, 0.03, -0.1, 0.0, 0.75),
            laser(0.06, 0.015, 0.05, 0.0, 0.75),
            laser(-0.06, 0.015, 0.05, 0.0, 0.75),
        ],
        ShipType::Pilsung => [1.0, -1.0]
            .into_iter()
            .flat_map(|side: f64| {
                [-0.1, -0.05, 0.0, 0.05]
                    .into_iter()
                    .map(move |z| laser(0.1 * side, 0.04, z, RIGHT * side, 0.8))
            })
            .collect(),
        ShipType::Hurricane => [1.0, -1.0]
            .into_iter()
            .flat_map(|side: f64| {
                let aft = [-1.225, -1.15, -1.075]
                    .into_iter()
                    .map(move |z| laser(0.325 * side, 0.0375, z, RIGHT * side, 0.85));
                let fore = [-0.35, -0.2875, -0.225, -0.1625]
                    .into_iter()
                    .map(move |z| laser(0.1 * side, 0.03, z, RIGHT * side, 0.75));
                aft.chain(fore)
            })
            .collect(),
        ShipType::Horizon => [1.0, -1.0]
            .into_iter()
            .flat_map(|side: f64| {
                (0..16).map(move |i| {
                    let i = f64::from(i);
                    laser(
                        (2.125 - 0.125 * i) * side,
                        0.055,
                        -0.5 + 0.5 * i,
                        std::f64::consts::PI * 5.0 / 12.0 * side,
                        1.5,
                    )
                })
            })
            .collect(),
    }
}

// --- Research ---

#[derive(Debug, Clone, Copy)]
pub struct ResearchSpec {
    pub id: ResearchId,
    pub recipe: &'static [(ItemId, f64)],
    pub xp: f64,
    /// Price multiplier per level already researched.
    pub scale: f64,
    pub max: u32,
    /// `(tech, needed)`: needed > 0 is a minimum level, needed == 0 forbids the tech.
    pub requires: &'static [(ResearchId, u32)],
}

pub fn research_spec(id: ResearchId) -> ResearchSpec {
    use ItemId::{Fuel, Metal, Minerals};
    use ResearchId as R;
    let (recipe, xp, scale, max, requires): (
        &'static [(ItemId, f64)],
        f64,
        f64,
        u32,
        &'static [(ResearchId, u32)],
    ) = match id {
        R::Armor => (&[(Metal, 1000.0)], 1.0, 1.5, 25, &[]),
        R::Laser => (&[(Minerals, 1000.0)], 1.0, 1.5, 25, &[]),
        R::Reload => (&[(Metal, 4000.0), (Minerals, 1500.0)], 1.0, 1.2, 10, &[]),
        R::Thrust => (&[(Fuel, 1000.0)], 1.0, 1.5, 25, &[]),
        R::Energy => (&[(Minerals, 1000.0), (Fuel, 5000.0)], 1.0, 1.5, 25, &[]),
        R::Shields => (
            &[(Metal, 2500.0), (Minerals, 5000.0)],
            1.0,
            1.5,
            10,
            &[(R::Armor, 5)],
        ),
        R::Storage => (
            &[(Metal, 10_000.0), (Minerals, 10_000.0), (Fuel, 10_000.0)],
            2.0,
            10.0,
            25,
            &[],
        ),
        R::Missle => (
            &[(Metal, 10_000.0), (Minerals, 1000.0), (Fuel, 5000.0)],
            1.0,
            1.5,
            25,
            &[(R::Laser, 5)],
        ),
        R::Regen => (
            &[(Metal, 50_000.0), (Minerals, 10_000.0), (Fuel, 10_000.0)],
            1.0,
            1.5,
            25,
            &[(R::Reload, 5), (R::Armor, 15)],
        ),
        R::Build => (
            &[(Metal, 100_000.0)],
            2.0,
            1.5,
            50,
            &[(R::Armor, 10), (R::Thrust, 10), (R::Reload, 10)],
        ),
        R::Salvage => (
            &[(Metal, 250_000.0), (Minerals, 50_000.0), (Fuel, 100_000.0)],
            5.0,
            1.25,
            25,
            &[(R::Build, 5)],
        ),
    };
    ResearchSpec {
        id,
        recipe,
        xp,
        scale,
        max,
        requires,
    }
}

/// Price of the next level of `id` when `level` levels are already researched.
pub fn research_price(id: ResearchId, level: u32) -> ItemCollection {
    let spec = research_spec(id);
    let exponent = i32::try_from(level).unwrap_or(i32::MAX);
    scale_items(&collect_items(spec.recipe), spec.scale.powi(exponent))
}

/// Whether the prerequisites of `id` block research given a lookup of current levels.
pub fn research_locked(id: ResearchId, level_of: impl Fn(ResearchId) -> u32) -> bool {
    research_spec(id).requires.iter().any(|(tech, needed)| {
        let have = level_of(*tech);
        (*needed > 0 && have < *needed) || (*needed == 0 && have > 0)
    })
}

/// Whether a research level map satisfies a list of requirements.
pub fn requirements_met(requires: &[(ResearchId, u32)], level_of: impl Fn(ResearchId) -> u32) -> bool {
    requires.iter().all(|(tech, needed)| level_of(*tech) >= *needed)
}

/// Fractional player level for an xp total.
pub fn xp_to_level(xp: f64) -> f64 {
    (xp / XP_PER_LEVEL_FACTOR).sqrt()
}

// --- Naming ---

pub const SYSTEM_NAMES: &[&str] = &[
    "Abrigato",
    "Kerali",
    "Kaltez",
    "Suzum",
    "Vespa",
    "Coruscare",
    "Vulca",
    "Jaeger",
    "Kashyyyk",
    "Outpost42",
    "Victoria",
    "Gesht",
    "Sanctuary",
    "Snowmass",
    "Ja",
    "Keeg",
    "Haemeiguli",
    "Borebalae",
    "Albataetarius",
    "Hataerius",
    "Achernaiphoros",
    "Antadrophei",
    "Hoemeirai",
    "Antabalis",
    "Hoereo",
    "Pazadam",
    "Equidor",
    "Pax",
    "Xena",
    "Titan",
    "Oturn",
    "Thuamia",
    "Heuthea",
    "Ditharus",
    "Muxater",
    "Trukovis",
    "Bichotune",
    "Etis",
    "Leorus",
    "Aphus",
    "Harophos",
    "Athena",
    "Hades",
    "Icarus",
    "Ureus",
    "Xentos Prime",
    "Ketlak",
    "Aerox",
    "Thryox",
    "Stratus",
    "Nox",
    "Sanctum",
    "Tinctus",
    "Morbus",
    "Neos",
    "Nomen",
    "Numerus",
];

pub const GREEK_LETTERS: &[&str] = &[
    "Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Eta", "Theta", "Iota",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardpoint_counts() {
        assert_eq!(hardpoint_slots(ShipType::Wind).len(), 1);
        assert_eq!(hardpoint_slots(ShipType::Cillus).len(), 0);
        assert_eq!(hardpoint_slots(ShipType::Pilsung).len(), 8);
        assert_eq!(hardpoint_slots(ShipType::Hurricane).len(), 14);
        assert_eq!(hardpoint_slots(ShipType::Horizon).len(), 32);
    }

    #[test]
    fn test_research_price_scales() {
        let base = research_price(ResearchId::Armor, 0);
        assert_eq!(base.get(&ItemId::Metal), Some(&1000.0));
        let second = research_price(ResearchId::Armor, 2);
        assert_eq!(second.get(&ItemId::Metal), Some(&2250.0));
    }

    #[test]
    fn test_research_lock() {
        assert!(research_locked(ResearchId::Shields, |_| 0));
        assert!(!research_locked(ResearchId::Shields, |t| if t == ResearchId::Armor { 5 } else { 0 }));
        assert!(!research_locked(ResearchId::Armor, |_| 0), "armor has no prerequisites");
    }

    #[test]
    fn test_fleet_for_power_is_greedy() {
        assert!(fleet_for_power(0.5).is_empty());
        assert_eq!(
            fleet_for_power(18.0),
            vec![ShipType::Pilsung, ShipType::Inca, ShipType::Mosquito, ShipType::Wind]
        );
        let fleet = fleet_for_power(137.0);
        let total: f64 = fleet.iter().map(|t| ship_spec(*t).power).sum();
        assert_eq!(total, 137.0, "every unit of power is spent");
        assert!(fleet.iter().all(|t| ship_spec(*t).enemy));
    }

    #[test]
    fn test_planet_name_table_covers_max_planets() {
        assert!(GREEK_LETTERS.len() >= crate::constants::PLANET_COUNT_MAX);
    }
}
