//! Procedural system generation.
//!
//! A generated system gets a star at its origin, a handful of planets and,
//! around each planet, a hostile fleet whose power grows with the system's
//! difficulty. Everything is drawn from the level rng, so the same seed
//! yields the same galaxy.

use glam::DVec2;
use rand::Rng;

use starlane_core::catalog::{fleet_for_power, GREEK_LETTERS, SYSTEM_NAMES};
use starlane_core::components::CelestialBody;
use starlane_core::constants::*;
use starlane_core::enums::PlanetBiome;
use starlane_core::snapshot::{KnownConnection, SystemConnection};
use starlane_core::types::{EntityId, SystemId};
use starlane_core::SimError;

use crate::level::{Level, LevelConfig};
use crate::random::{random_between, random_id, random_on_circle, random_on_sphere, recursive_count};
use crate::star_system::{difficulty_at, StarSystem};

/// Upper bound on the unexplored links a system starts with.
const MAX_CONNECTIONS: usize = 8;

impl Level {
    /// A new level with a generated root system at the galaxy origin.
    pub fn generate(config: LevelConfig) -> Result<Self, SimError> {
        let mut level = Level::new(config);
        let name = SYSTEM_NAMES[level.rng.gen_range(0..SYSTEM_NAMES.len())];
        level.generate_system(name, DVec2::ZERO)?;
        tracing::info!(level = %level.id, name = %level.name, "level generated");
        Ok(level)
    }

    /// Generate and populate a system at `position` on the galaxy map.
    pub fn generate_system(&mut self, name: &str, position: DVec2) -> Result<SystemId, SimError> {
        let id = SystemId(random_id(&mut self.rng));
        let mut system = StarSystem::new(id.clone(), name, position);
        system.difficulty = difficulty_at(position);
        let links = recursive_count(&mut self.rng, CONNECTION_PROBABILITY, MAX_CONNECTIONS);
        for _ in 0..links {
            let offset = random_on_circle(&mut self.rng, CONNECTION_SPREAD);
            system
                .connections
                .push(SystemConnection::Known(KnownConnection::Position(position + offset)));
        }
        let difficulty = system.difficulty;
        self.add_system(system)?;

        let star_radius = random_between(&mut self.rng, STAR_RADIUS_MIN, STAR_RADIUS_MAX);
        let color = self.star_color();
        let seed = self.rng.gen::<f64>();
        self.spawn_star(&id, name, star_radius, color, seed)?;

        let planets = self.rng.gen_range(PLANET_COUNT_MIN..=PLANET_COUNT_MAX);
        for i in 0..planets {
            let planet = self.generate_planet(&id, name, i, star_radius)?;
            let power = (difficulty * (i + 1) as f64).powi(2);
            self.spawn_guard_fleet(&id, &planet, power)?;
        }
        tracing::info!(system = %id, name, difficulty, planets, "system generated");
        Ok(id)
    }

    fn star_color(&mut self) -> [f64; 3] {
        let base = random_between(&mut self.rng, 0.3, 0.4);
        let mut channel = || self.rng.gen::<f64>().powi(3) / 2.0 + base;
        [channel(), channel(), channel()]
    }

    fn generate_planet(
        &mut self,
        system: &SystemId,
        system_name: &str,
        index: usize,
        star_radius: f64,
    ) -> Result<EntityId, SimError> {
        let name = match GREEK_LETTERS.get(index) {
            Some(letter) => format!("{system_name} {letter}"),
            None => format!("{system_name} {}", index + 1),
        };
        let radius = random_between(&mut self.rng, PLANET_RADIUS_MIN, PLANET_RADIUS_MAX);
        let orbit = random_between(&mut self.rng, (star_radius + radius) * 1.5, PLANET_MAX_ORBIT);
        let position = random_on_sphere(&mut self.rng, orbit, true);
        let biome = PlanetBiome::ALL[self.rng.gen_range(0..PlanetBiome::ALL.len())];
        let seed = self.rng.gen::<f64>();
        self.spawn_planet(system, &name, position, radius, biome, seed)
    }

    /// Hostile ships parked around a planet, owned by the planet.
    fn spawn_guard_fleet(
        &mut self,
        system: &SystemId,
        planet: &EntityId,
        power: f64,
    ) -> Result<(), SimError> {
        let anchor = self.absolute_position(planet)?;
        let radius = self.read::<CelestialBody>(planet)?.radius;
        for ship_type in fleet_for_power(power) {
            let distance = random_between(&mut self.rng, radius + 5.0, radius * 1.25);
            let position = anchor + random_on_sphere(&mut self.rng, distance, true);
            self.spawn_ship(ship_type, system, position, Some(planet))?;
        }
        Ok(())
    }
}
