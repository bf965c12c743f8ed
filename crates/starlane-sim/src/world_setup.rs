//! Entity spawn factories.
//!
//! Creates stars, planets, ships (with their hardpoints) and players with
//! the component bundle each kind needs, then announces them.

use glam::DVec3;
use hecs::EntityBuilder;

use starlane_core::catalog::{hardpoint_slots, hardpoint_spec, ship_spec};
use starlane_core::components::*;
use starlane_core::constants::CELESTIAL_STORAGE_MAX;
use starlane_core::enums::{EntityKind, PlanetBiome, ShipType};
use starlane_core::storage::Storage;
use starlane_core::types::{EntityId, SystemId};
use starlane_core::SimError;

use crate::level::Level;
use crate::random::random_on_sphere;

/// Ships every new player starts with.
pub const STARTER_FLEET: [ShipType; 2] = [ShipType::Mosquito, ShipType::Cillus];

/// Distance from the system origin at which new players appear.
const PLAYER_SPAWN_DISTANCE: f64 = 1000.0;

/// Components shared by every entity kind.
pub(crate) fn base_builder(
    transform: Transform,
    relations: Relations,
    flags: EntityFlags,
) -> EntityBuilder {
    let mut builder = EntityBuilder::new();
    builder.add(transform).add(relations).add(flags);
    builder
}

fn identity(id: EntityId, name: impl Into<String>, kind: EntityKind) -> Identity {
    Identity {
        id,
        name: name.into(),
        kind,
    }
}

fn body_flags() -> EntityFlags {
    EntityFlags {
        is_obstacle: true,
        ..EntityFlags::default()
    }
}

impl Level {
    /// Spawn a star at the origin of `system`.
    pub fn spawn_star(
        &mut self,
        system: &SystemId,
        name: &str,
        radius: f64,
        color: [f64; 3],
        seed: f64,
    ) -> Result<EntityId, SimError> {
        let id = self.new_entity_id();
        let mut builder = base_builder(Transform::default(), Relations::default(), body_flags());
        builder
            .add(CelestialBody {
                radius,
                seed,
                rewards: Storage::new(CELESTIAL_STORAGE_MAX),
            })
            .add(StarColor(color))
            .add(Fleet::default());
        self.insert_entity(builder, identity(id.clone(), name, EntityKind::Star), system.clone())?;
        self.announce(&id)?;
        Ok(id)
    }

    pub fn spawn_planet(
        &mut self,
        system: &SystemId,
        name: &str,
        position: DVec3,
        radius: f64,
        biome: PlanetBiome,
        seed: f64,
    ) -> Result<EntityId, SimError> {
        let id = self.new_entity_id();
        let transform = Transform {
            position,
            ..Transform::default()
        };
        let mut builder = base_builder(transform, Relations::default(), body_flags());
        builder
            .add(CelestialBody {
                radius,
                seed,
                rewards: Storage::new(CELESTIAL_STORAGE_MAX),
            })
            .add(PlanetSurface { biome })
            .add(Fleet {
                position,
                ships: Vec::new(),
            });
        self.insert_entity(builder, identity(id.clone(), name, EntityKind::Planet), system.clone())?;
        self.announce(&id)?;
        Ok(id)
    }

    /// Spawn a ship with its hardpoints. With an owner, the ship joins the
    /// owner's fleet; the owner must be a player or celestial body.
    pub fn spawn_ship(
        &mut self,
        ship_type: ShipType,
        system: &SystemId,
        position: DVec3,
        owner: Option<&EntityId>,
    ) -> Result<EntityId, SimError> {
        if self.system(system).is_none() {
            return Err(SimError::UnknownSystem(system.clone()));
        }
        if let Some(owner) = owner {
            // Validate before anything is spawned.
            self.read::<Fleet>(owner)?;
        }

        let spec = ship_spec(ship_type);
        let ship_id = self.new_entity_id();
        let relations = Relations {
            owner: owner.cloned(),
            parent: None,
        };

        let mut hardpoints = Vec::new();
        for slot in hardpoint_slots(ship_type) {
            let hardpoint_id = self.new_entity_id();
            let transform = Transform {
                position: slot.position,
                rotation: slot.rotation,
                velocity: DVec3::ZERO,
            };
            let mut builder = base_builder(
                transform,
                Relations {
                    owner: owner.cloned(),
                    parent: Some(ship_id.clone()),
                },
                EntityFlags::default(),
            );
            builder.add(HardpointState {
                hardpoint_type: slot.hardpoint_type,
                scale: slot.scale,
                reload: hardpoint_spec(slot.hardpoint_type).reload,
                projectiles: Vec::new(),
            });
            let name = format!("{:?}", slot.hardpoint_type);
            self.insert_entity(
                builder,
                identity(hardpoint_id.clone(), name, EntityKind::Hardpoint),
                system.clone(),
            )?;
            hardpoints.push(hardpoint_id);
        }

        let transform = Transform {
            position,
            ..Transform::default()
        };
        let flags = EntityFlags {
            is_targetable: true,
            ..EntityFlags::default()
        };
        let mut builder = base_builder(transform, relations, flags);
        builder
            .add(ShipState {
                ship_type,
                hp: spec.hp,
                jump_cooldown: 0,
                storage: Storage::new(spec.storage),
                hardpoints: hardpoints.clone(),
            })
            .add(PathQueue::default());
        let name = format!("{ship_type:?}");
        self.insert_entity(builder, identity(ship_id.clone(), name, EntityKind::Ship), system.clone())?;

        if let Some(owner) = owner {
            let handle = self.handle(owner)?;
            if let Ok(mut fleet) = self.world.get::<&mut Fleet>(handle) {
                fleet.ships.push(ship_id.clone());
            }
            self.refresh_capacity(owner)?;
        }

        for hardpoint in &hardpoints {
            self.announce(hardpoint)?;
        }
        self.announce(&ship_id)?;
        tracing::debug!(ship = %ship_id, ?ship_type, %system, "ship spawned");
        Ok(ship_id)
    }

    /// Spawn a player in the root system with the starter fleet.
    pub fn spawn_player(&mut self, id: EntityId, name: &str) -> Result<EntityId, SimError> {
        let system = self
            .root_system
            .clone()
            .ok_or_else(|| SimError::UnknownSystem(SystemId::new("root")))?;
        if self.contains(&id) {
            return Err(SimError::DuplicateEntity(id));
        }
        let position = random_on_sphere(&mut self.rng, PLAYER_SPAWN_DISTANCE, true);
        let transform = Transform {
            position,
            ..Transform::default()
        };
        let relations = Relations {
            owner: Some(id.clone()),
            parent: None,
        };
        let mut builder = base_builder(transform, relations, EntityFlags::default());
        builder
            .add(PlayerState::default())
            .add(Fleet {
                position,
                ships: Vec::new(),
            })
            .add(PathQueue::default());
        self.insert_entity(builder, identity(id.clone(), name, EntityKind::Player), system.clone())?;
        self.announce(&id)?;

        for (i, ship_type) in STARTER_FLEET.into_iter().enumerate() {
            let offset = DVec3::new(0.0, 0.0, 4.0 * i as f64);
            self.spawn_ship(ship_type, &system, position + offset, Some(&id))?;
        }
        tracing::info!(player = %id, name, "player spawned");
        Ok(id)
    }
}
