//! Snapshot save/load and replica mirroring.
//!
//! Loading resolves references strictly: a ship claims hardpoints that are
//! already loaded, and a player claims fleet ships that are already loaded.
//! Celestial bodies rebuild their fleets from the ships they own.

use std::collections::BTreeMap;
use std::path::Path;

use starlane_core::catalog::{hardpoint_spec, ship_spec};
use starlane_core::components::*;
use starlane_core::enums::{EntityKind, ResearchId};
use starlane_core::events::{LevelEvent, SequencedEvent};
use starlane_core::snapshot::{EntityData, EntitySnapshot, LevelSnapshot};
use starlane_core::types::EntityId;
use starlane_core::version::{self, CURRENT_VERSION};
use starlane_core::{SimError, VersionError};

use crate::level::{Level, LevelConfig};
use crate::star_system::StarSystem;
use crate::systems;
use crate::world_setup::base_builder;

/// Reference bookkeeping for one load.
#[derive(Debug, Default)]
struct Loader {
    /// Hardpoints not yet claimed by a ship, with the parent they name.
    orphan_hardpoints: BTreeMap<EntityId, EntityId>,
    /// Ships whose owner is not loaded yet, with the owner they name.
    orphan_ships: BTreeMap<EntityId, EntityId>,
}

impl Loader {
    fn load(&mut self, level: &mut Level, snapshot: EntitySnapshot) -> Result<(), SimError> {
        let id = snapshot.id.clone();
        let owner = snapshot.owner.clone();
        let parent = snapshot.parent.clone();

        // Validate references before anything is inserted.
        match &snapshot.data {
            EntityData::Ship(ship) => {
                for hardpoint in &ship.hardpoints {
                    let mounted = level.contains(hardpoint)
                        && level.read::<Relations>(hardpoint)?.parent.as_ref() == Some(&id);
                    if !mounted {
                        return Err(SimError::UnresolvedReference {
                            id: id.clone(),
                            reference: hardpoint.clone(),
                        });
                    }
                }
            }
            EntityData::Player(player) => {
                if let Some(missing) = player.fleet.ships.iter().find(|s| !level.contains(s)) {
                    return Err(SimError::UnknownEntity(missing.clone()));
                }
            }
            _ => {}
        }

        let kind = snapshot.kind();
        level.insert_snapshot(snapshot)?;

        match kind {
            EntityKind::Hardpoint => {
                if let Some(parent) = parent {
                    self.orphan_hardpoints.insert(id, parent);
                }
            }
            EntityKind::Ship => {
                let ship = level.read::<ShipState>(&id)?;
                for hardpoint in &ship.hardpoints {
                    self.orphan_hardpoints.remove(hardpoint);
                }
                match owner {
                    Some(owner) if level.contains(&owner) => attach(level, &owner, &id)?,
                    Some(owner) => {
                        self.orphan_ships.insert(id, owner);
                    }
                    None => {}
                }
            }
            EntityKind::Player => {
                for ship in level.read::<Fleet>(&id)?.ships {
                    self.orphan_ships.remove(&ship);
                }
            }
            EntityKind::Star | EntityKind::Planet => {
                let claimed: Vec<EntityId> = self
                    .orphan_ships
                    .iter()
                    .filter(|(_, owner)| **owner == id)
                    .map(|(ship, _)| ship.clone())
                    .collect();
                for ship in claimed {
                    self.orphan_ships.remove(&ship);
                    attach(level, &id, &ship)?;
                }
            }
        }
        Ok(())
    }

    /// Fail on the first reference nobody claimed.
    fn finish(self) -> Result<(), SimError> {
        if let Some((id, reference)) = self.orphan_hardpoints.into_iter().next() {
            return Err(SimError::UnresolvedReference { id, reference });
        }
        if let Some((id, reference)) = self.orphan_ships.into_iter().next() {
            return Err(SimError::UnresolvedReference { id, reference });
        }
        Ok(())
    }
}

/// Add `ship` to the fleet of `owner` unless it is already listed.
fn attach(level: &mut Level, owner: &EntityId, ship: &EntityId) -> Result<(), SimError> {
    let handle = level.handle(owner)?;
    let mut fleet = level
        .world
        .get::<&mut Fleet>(handle)
        .map_err(|_| SimError::WrongEntityType {
            id: owner.clone(),
            expected: EntityKind::Player,
        })?;
    if !fleet.ships.contains(ship) {
        fleet.ships.push(ship.clone());
    }
    Ok(())
}

/// Seed for a loaded level's rng, derived from its id.
fn seed_from_id(id: &str) -> u64 {
    id.bytes()
        .fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        })
}

impl Level {
    /// Serialize every saveable entity, in load order.
    pub fn to_snapshot(&self) -> Result<LevelSnapshot, SimError> {
        let mut entities = Vec::new();
        for id in self.entity_ids() {
            if self.read::<EntityFlags>(id)?.is_saveable {
                entities.push(self.entity_snapshot(id)?);
            }
        }
        entities.sort_by_key(|entity| entity.kind().load_priority());
        Ok(LevelSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            version: CURRENT_VERSION.to_string(),
            date: self.date,
            difficulty: self.difficulty,
            systems: self.systems.iter().map(StarSystem::to_snapshot).collect(),
            entities,
        })
    }

    /// Rebuild a level from a current-version snapshot. Entities may come in
    /// any order; they are loaded by kind priority.
    pub fn from_snapshot(snapshot: LevelSnapshot) -> Result<Self, SimError> {
        if snapshot.version != CURRENT_VERSION {
            return Err(if version::is_known(&snapshot.version) {
                VersionError::Unsupported(snapshot.version).into()
            } else {
                VersionError::Unknown(snapshot.version).into()
            });
        }
        let mut level = Level::new(LevelConfig {
            seed: seed_from_id(&snapshot.id),
            name: snapshot.name,
        });
        level.id = snapshot.id;
        level.date = snapshot.date;
        level.difficulty = snapshot.difficulty;
        for system in snapshot.systems {
            level.add_system(StarSystem::from_snapshot(system))?;
        }

        let mut entities = snapshot.entities;
        entities.sort_by_key(|entity| entity.kind().load_priority());
        level.load_entities_strict(entities)?;
        tracing::info!(level = %level.id, entities = level.entity_ids().len(), "level loaded");
        Ok(level)
    }

    /// Load a snapshot document of any known version.
    pub fn from_json(mut document: serde_json::Value) -> Result<Self, SimError> {
        version::upgrade(&mut document)?;
        let snapshot: LevelSnapshot = serde_json::from_value(document)?;
        Level::from_snapshot(snapshot)
    }

    /// Load entities exactly in the given order. Emits no events.
    pub fn load_entities_strict(&mut self, entities: Vec<EntitySnapshot>) -> Result<(), SimError> {
        let mut loader = Loader::default();
        for entity in entities {
            loader.load(self, entity)?;
        }
        loader.finish()
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), SimError> {
        let snapshot = self.to_snapshot()?;
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path, json)?;
        tracing::info!(level = %self.id, path = %path.display(), "level saved");
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        let document: serde_json::Value = serde_json::from_str(&text)?;
        let level = Level::from_json(document)?;
        tracing::info!(level = %level.id, path = %path.display(), "level read from disk");
        Ok(level)
    }

    /// Continue numbering events after `sequence`, e.g. for a replica
    /// rebuilt from an authority snapshot taken at that point.
    pub fn resume_sequence(&mut self, sequence: u64) {
        self.next_seq = sequence;
    }

    /// Mirror one authority event onto this level.
    ///
    /// Events must arrive in sequence order without gaps. On
    /// `SequenceGap` the replica is stale and must be rebuilt from a snapshot.
    /// `update` replays the tick's motion and timers locally.
    pub fn apply_event(&mut self, event: &SequencedEvent) -> Result<(), SimError> {
        if event.seq != self.next_seq {
            return Err(SimError::SequenceGap {
                expected: self.next_seq,
                got: event.seq,
            });
        }
        match &event.event {
            LevelEvent::EntityAdded { entity } => {
                if !self.contains(&entity.id) {
                    Loader::default().load(self, entity.clone())?;
                }
            }
            LevelEvent::EntityRemoved { entity } | LevelEvent::EntityDeath { entity, .. } => {
                if self.contains(&entity.id) {
                    self.remove_entity_inner(&entity.id, false)?;
                }
            }
            LevelEvent::EntityPathStart { entity, waypoints } => {
                self.install_path(entity, waypoints)?;
            }
            LevelEvent::EntityJump { entity, to, .. } => {
                let ship = self.read::<ShipState>(entity)?;
                self.complete_jump(entity, to, ship_spec(ship.ship_type).jump_cooldown)?;
            }
            LevelEvent::FleetItemsChange { holdings, .. } => {
                for holding in holdings {
                    let handle = self.handle(&holding.ship)?;
                    if let Ok(mut ship) = self.world.get::<&mut ShipState>(handle) {
                        ship.storage = holding.storage.clone();
                    }
                }
            }
            LevelEvent::ProjectileFire {
                hardpoint,
                target,
                projectile,
                position,
                velocity,
                ticks,
                damage,
                critical,
            } => {
                let handle = self.handle(hardpoint)?;
                if let Ok(mut state) = self.world.get::<&mut HardpointState>(handle) {
                    state.reload = hardpoint_spec(state.hardpoint_type).reload;
                    state.projectiles.push(Projectile {
                        id: projectile.clone(),
                        target: target.clone(),
                        position: *position,
                        velocity: *velocity,
                        ticks_remaining: *ticks,
                        damage: *damage,
                        critical: *critical,
                    });
                }
            }
            LevelEvent::EntityHit { entity, hp, .. } => {
                let handle = self.handle(entity)?;
                if let Ok(mut ship) = self.world.get::<&mut ShipState>(handle) {
                    ship.hp = *hp;
                }
            }
            LevelEvent::RewardsChange { owner, rewards } => {
                let handle = self.handle(owner)?;
                if let Ok(mut body) = self.world.get::<&mut CelestialBody>(handle) {
                    body.rewards = rewards.clone();
                }
            }
            LevelEvent::PlayerUpdate { player }
            | LevelEvent::PlayerLevelup { player }
            | LevelEvent::PlayerReset { player } => {
                self.mirror_player(player)?;
            }
            LevelEvent::Update { tick } => {
                self.time.tick = *tick;
                systems::mirror(self);
            }
        }
        self.next_seq = event.seq + 1;
        Ok(())
    }

    /// Overwrite a player's progress from an authority snapshot. Storage
    /// research also rescales the fleet's capacity.
    fn mirror_player(&mut self, player: &EntitySnapshot) -> Result<(), SimError> {
        let EntityData::Player(data) = &player.data else {
            return Ok(());
        };
        let handle = self.expect_kind(&player.id, EntityKind::Player)?;
        let storage_level = |research: &BTreeMap<ResearchId, u32>| {
            research.get(&ResearchId::Storage).copied().unwrap_or(0)
        };
        let rescale = {
            let mut state = self
                .world
                .get::<&mut PlayerState>(handle)
                .map_err(|_| SimError::UnknownEntity(player.id.clone()))?;
            let rescale = storage_level(&state.research) != storage_level(&data.research);
            state.research = data.research.clone();
            state.xp = data.xp;
            state.xp_points = data.xp_points;
            rescale
        };
        if rescale {
            self.refresh_capacity(&player.id)?;
        }
        Ok(())
    }

    /// Insert an entity exactly as described by its snapshot. Celestial
    /// bodies start with an empty fleet. Emits no events.
    pub(crate) fn insert_snapshot(&mut self, snapshot: EntitySnapshot) -> Result<(), SimError> {
        let kind = snapshot.kind();
        let transform = Transform {
            position: snapshot.position,
            rotation: snapshot.rotation,
            velocity: snapshot.velocity,
        };
        let relations = Relations {
            owner: snapshot.owner,
            parent: snapshot.parent,
        };
        let flags = EntityFlags {
            is_targetable: snapshot.is_targetable,
            is_obstacle: kind.is_celestial_body(),
            is_selected: snapshot.is_selected,
            is_saveable: true,
        };
        let path = PathQueue {
            waypoints: snapshot.path.into_iter().collect(),
        };

        let mut builder = base_builder(transform, relations, flags);
        match snapshot.data {
            EntityData::Star(star) => {
                builder
                    .add(CelestialBody {
                        radius: star.radius,
                        seed: star.seed,
                        rewards: star.rewards,
                    })
                    .add(StarColor(star.color))
                    .add(Fleet {
                        position: star.fleet.position,
                        ships: Vec::new(),
                    });
            }
            EntityData::Planet(planet) => {
                builder
                    .add(CelestialBody {
                        radius: planet.radius,
                        seed: planet.seed,
                        rewards: planet.rewards,
                    })
                    .add(PlanetSurface {
                        biome: planet.biome,
                    })
                    .add(Fleet {
                        position: planet.fleet.position,
                        ships: Vec::new(),
                    });
            }
            EntityData::Hardpoint(hardpoint) => {
                builder.add(HardpointState {
                    hardpoint_type: hardpoint.hardpoint_type,
                    scale: hardpoint.scale,
                    reload: hardpoint.reload,
                    projectiles: hardpoint.projectiles,
                });
            }
            EntityData::Ship(ship) => {
                builder
                    .add(ShipState {
                        ship_type: ship.ship_type,
                        hp: ship.hp,
                        jump_cooldown: ship.jump_cooldown,
                        storage: ship.storage,
                        hardpoints: ship.hardpoints,
                    })
                    .add(path);
            }
            EntityData::Player(player) => {
                builder
                    .add(PlayerState {
                        research: player.research,
                        xp: player.xp,
                        xp_points: player.xp_points,
                    })
                    .add(player.fleet)
                    .add(path);
            }
        }
        let identity = Identity {
            id: snapshot.id,
            name: snapshot.name,
            kind,
        };
        self.insert_entity(builder, identity, snapshot.system)?;
        Ok(())
    }
}
