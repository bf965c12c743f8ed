//! The level: root aggregate and tick orchestrator.
//!
//! `Level` owns the hecs world, the entity registry, every system and the
//! tick clock. It is the only component allowed to apply actions to state.
//! Completely headless, enabling deterministic testing.

use std::collections::{HashSet, VecDeque};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use glam::DVec3;
use hecs::{Entity, EntityBuilder, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use starlane_core::actions::{ActionReceipt, ActionRequest};
use starlane_core::components::*;
use starlane_core::constants::{MIN_SYSTEM_DIFFICULTY, PERFORMANCE_SAMPLES};
use starlane_core::enums::{EntityKind, LevelState};
use starlane_core::events::{LevelEvent, SequencedEvent};
use starlane_core::snapshot::*;
use starlane_core::types::{EntityId, SimTime, SystemId};
use starlane_core::SimError;

use crate::random::random_id;
use crate::registry::Registry;
use crate::star_system::StarSystem;
use crate::systems;

/// Configuration for creating a new level.
#[derive(Debug, Clone)]
pub struct LevelConfig {
    /// RNG seed for determinism. Same seed = same level.
    pub seed: u64,
    pub name: String,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            name: "Starlane".to_string(),
        }
    }
}

/// Diagnostics counters, reset at the start of every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickStats {
    pub additions: u32,
    pub removals: u32,
    pub updates: u32,
}

/// A ship destroyed this tick, awaiting cleanup.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingDeath {
    pub victim: EntityId,
    /// The ship whose projectile landed the final hit.
    pub killer: Option<EntityId>,
    /// The killer's owner at the time of the hit; receives the rewards.
    pub beneficiary: Option<EntityId>,
}

/// Rolling ticks-per-second estimate over the last few tick starts.
#[derive(Debug, Default)]
struct PerformanceMonitor {
    starts: VecDeque<Instant>,
}

impl PerformanceMonitor {
    fn sample(&mut self) {
        if self.starts.len() == PERFORMANCE_SAMPLES {
            self.starts.pop_front();
        }
        self.starts.push_back(Instant::now());
    }

    fn tps(&self) -> f64 {
        match (self.starts.front(), self.starts.back()) {
            (Some(first), Some(last)) if self.starts.len() > 1 => {
                let secs = last.duration_since(*first).as_secs_f64();
                if secs > 0.0 {
                    (self.starts.len() - 1) as f64 / secs
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }
}

/// The simulation root. Owns the ECS world and all level state.
pub struct Level {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) date: u64,
    pub(crate) difficulty: f64,
    pub(crate) world: World,
    pub(crate) registry: Registry,
    pub(crate) systems: Vec<StarSystem>,
    pub(crate) root_system: Option<SystemId>,
    pub(crate) rng: ChaCha8Rng,
    /// Ships that reached zero hp this tick.
    pub(crate) pending_deaths: Vec<PendingDeath>,
    pub(crate) stats: TickStats,
    pub(crate) time: SimTime,
    pub(crate) next_seq: u64,
    pub(crate) action_queue: VecDeque<(u64, ActionRequest)>,
    pub(crate) receipts: Vec<ActionReceipt>,
    state: LevelState,
    performance: PerformanceMonitor,
    next_ticket: u64,
    events: Vec<SequencedEvent>,
    updated: Vec<EntityId>,
}

impl Level {
    /// Create an empty level with no systems.
    pub fn new(config: LevelConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let id = random_id(&mut rng);
        let date = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            id,
            name: config.name,
            date,
            difficulty: MIN_SYSTEM_DIFFICULTY,
            world: World::new(),
            registry: Registry::default(),
            systems: Vec::new(),
            root_system: None,
            rng,
            pending_deaths: Vec::new(),
            stats: TickStats::default(),
            time: SimTime::default(),
            next_seq: 0,
            action_queue: VecDeque::new(),
            receipts: Vec::new(),
            state: LevelState::Idle,
            performance: PerformanceMonitor::default(),
            next_ticket: 0,
            events: Vec::new(),
            updated: Vec::new(),
        }
    }

    // --- Lifecycle ---

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn start(&mut self) -> Result<(), SimError> {
        self.transition(LevelState::Running)
    }

    pub fn begin_stop(&mut self) -> Result<(), SimError> {
        self.transition(LevelState::Stopping)
    }

    pub fn finish_stop(&mut self) -> Result<(), SimError> {
        self.transition(LevelState::Stopped)
    }

    /// Stop a running level in one step.
    pub fn stop(&mut self) -> Result<(), SimError> {
        self.begin_stop()?;
        self.finish_stop()
    }

    /// Resume a level that is stopping.
    pub fn restart(&mut self) -> Result<(), SimError> {
        if self.state != LevelState::Stopping {
            return Err(SimError::InvalidTransition {
                from: self.state,
                to: LevelState::Running,
            });
        }
        self.transition(LevelState::Running)
    }

    fn transition(&mut self, to: LevelState) -> Result<(), SimError> {
        let allowed = matches!(
            (self.state, to),
            (LevelState::Idle, LevelState::Running)
                | (LevelState::Running, LevelState::Stopping)
                | (LevelState::Stopping, LevelState::Running)
                | (LevelState::Stopping, LevelState::Stopped)
        );
        if !allowed {
            return Err(SimError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::debug!(level = %self.id, from = ?self.state, ?to, "level transition");
        self.state = to;
        Ok(())
    }

    // --- Tick ---

    /// Advance the level by one tick. Does nothing unless the level is running.
    pub fn tick(&mut self) {
        if self.state != LevelState::Running {
            return;
        }
        self.stats = TickStats::default();
        self.performance.sample();

        self.process_actions();
        self.emit(LevelEvent::Update {
            tick: self.time.tick,
        });
        systems::run(self);
        systems::cleanup::run(self);

        self.time.advance();
        tracing::trace!(tick = self.time.tick, stats = ?self.stats, "tick complete");
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    /// Rolling ticks per second.
    pub fn tps(&self) -> f64 {
        self.performance.tps()
    }

    // --- Outputs ---

    pub(crate) fn emit(&mut self, event: LevelEvent) {
        self.events.push(SequencedEvent {
            seq: self.next_seq,
            tick: self.time.tick,
            event,
        });
        self.next_seq += 1;
    }

    /// Take every event emitted since the last drain, in sequence order.
    pub fn drain_events(&mut self) -> Vec<SequencedEvent> {
        std::mem::take(&mut self.events)
    }

    /// Take the ids of entities updated since the last drain, each once,
    /// in first-update order. Ids removed since are dropped.
    pub fn drain_updated(&mut self) -> Vec<EntityId> {
        let mut seen = HashSet::new();
        std::mem::take(&mut self.updated)
            .into_iter()
            .filter(|id| self.registry.contains(id) && seen.insert(id.clone()))
            .collect()
    }

    /// Take the outcomes of queued actions applied since the last drain.
    pub fn drain_receipts(&mut self) -> Vec<ActionReceipt> {
        std::mem::take(&mut self.receipts)
    }

    /// Sequence number the next emitted event will carry.
    pub fn next_sequence(&self) -> u64 {
        self.next_seq
    }

    pub(crate) fn mark_updated(&mut self, id: &EntityId) {
        self.stats.updates += 1;
        self.updated.push(id.clone());
    }

    pub(crate) fn next_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    // --- Accessors ---

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn systems(&self) -> &[StarSystem] {
        &self.systems
    }

    pub fn system(&self, id: &SystemId) -> Option<&StarSystem> {
        self.systems.iter().find(|s| &s.id == id)
    }

    pub fn root_system(&self) -> Option<&SystemId> {
        self.root_system.as_ref()
    }

    pub fn add_system(&mut self, system: StarSystem) -> Result<(), SimError> {
        if self.system(&system.id).is_some() {
            return Err(SimError::DuplicateSystem(system.id));
        }
        if self.root_system.is_none() {
            self.root_system = Some(system.id.clone());
        }
        tracing::debug!(system = %system.id, name = %system.name, "system added");
        self.systems.push(system);
        Ok(())
    }

    /// Every live entity id, in master iteration order.
    pub fn entity_ids(&self) -> &[EntityId] {
        self.registry.order()
    }

    /// Ids of the entities in one system, in master iteration order.
    pub fn system_members(&self, system: &SystemId) -> &[EntityId] {
        self.registry.members(system)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.registry.contains(id)
    }

    pub fn handle(&self, id: &EntityId) -> Result<Entity, SimError> {
        self.registry
            .handle(id)
            .ok_or_else(|| SimError::UnknownEntity(id.clone()))
    }

    pub fn kind(&self, id: &EntityId) -> Result<EntityKind, SimError> {
        let handle = self.handle(id)?;
        self.world
            .get::<&Identity>(handle)
            .map(|identity| identity.kind)
            .map_err(|_| SimError::UnknownEntity(id.clone()))
    }

    /// Clone a component of a live entity.
    pub fn read<T: hecs::Component + Clone>(&self, id: &EntityId) -> Result<T, SimError> {
        let handle = self.handle(id)?;
        match self.world.get::<&T>(handle) {
            Ok(component) => Ok((*component).clone()),
            Err(hecs::ComponentError::NoSuchEntity) => Err(SimError::UnknownEntity(id.clone())),
            Err(hecs::ComponentError::MissingComponent(_)) => Err(SimError::WrongEntityType {
                id: id.clone(),
                expected: self.kind(id)?,
            }),
        }
    }

    /// Require `id` to be a live entity of `kind`.
    pub fn expect_kind(&self, id: &EntityId, kind: EntityKind) -> Result<Entity, SimError> {
        let handle = self.handle(id)?;
        if self.kind(id)? != kind {
            return Err(SimError::WrongEntityType {
                id: id.clone(),
                expected: kind,
            });
        }
        Ok(handle)
    }

    pub fn system_of(&self, id: &EntityId) -> Result<SystemId, SimError> {
        Ok(self.read::<Placement>(id)?.system)
    }

    /// World-space position: the local position plus every parent's.
    pub fn absolute_position(&self, id: &EntityId) -> Result<DVec3, SimError> {
        let mut position = self.read::<Transform>(id)?.position;
        let mut parent = self.read::<Relations>(id)?.parent;
        let mut depth = 0;
        while let Some(parent_id) = parent {
            // Parents may be unresolved while a snapshot is half loaded.
            let Ok(transform) = self.read::<Transform>(&parent_id) else {
                break;
            };
            position += transform.position;
            parent = self.read::<Relations>(&parent_id)?.parent;
            depth += 1;
            if depth > 8 {
                break;
            }
        }
        Ok(position)
    }

    // --- Entity storage ---

    /// Generate a fresh entity id.
    pub(crate) fn new_entity_id(&mut self) -> EntityId {
        EntityId(random_id(&mut self.rng))
    }

    /// Spawn an entity built from `builder`, which must already carry every
    /// component for its kind. Does not emit events.
    pub(crate) fn insert_entity(
        &mut self,
        mut builder: EntityBuilder,
        identity: Identity,
        system: SystemId,
    ) -> Result<Entity, SimError> {
        if self.system(&system).is_none() {
            return Err(SimError::UnknownSystem(system));
        }
        if self.registry.contains(&identity.id) {
            return Err(SimError::DuplicateEntity(identity.id));
        }
        let id = identity.id.clone();
        builder.add(identity).add(Placement {
            system: system.clone(),
        });
        let handle = self.world.spawn(builder.build());
        self.registry.insert(id, handle, &system);
        self.stats.additions += 1;
        Ok(handle)
    }

    /// Emit `entity_added` for an entity that is fully wired.
    pub(crate) fn announce(&mut self, id: &EntityId) -> Result<(), SimError> {
        let entity = self.entity_snapshot(id)?;
        self.emit(LevelEvent::EntityAdded { entity });
        Ok(())
    }

    /// Remove an entity and everything that depends on it.
    ///
    /// Ships take their hardpoints with them and leave their owner's fleet.
    /// Players and celestial bodies take their fleets with them.
    pub fn remove_entity(&mut self, id: &EntityId) -> Result<(), SimError> {
        self.remove_entity_inner(id, true)
    }

    pub(crate) fn remove_entity_inner(&mut self, id: &EntityId, emit: bool) -> Result<(), SimError> {
        let kind = self.kind(id)?;
        match kind {
            EntityKind::Ship => {
                let ship = self.read::<ShipState>(id)?;
                for hardpoint in &ship.hardpoints {
                    if self.contains(hardpoint) {
                        self.remove_entity_inner(hardpoint, emit)?;
                    }
                }
                if let Some(owner) = self.read::<Relations>(id)?.owner {
                    self.detach_from_fleet(&owner, id);
                }
            }
            EntityKind::Player | EntityKind::Star | EntityKind::Planet => {
                let fleet = self.read::<Fleet>(id)?;
                for ship in &fleet.ships {
                    if self.contains(ship) {
                        self.remove_entity_inner(ship, emit)?;
                    }
                }
            }
            EntityKind::Hardpoint => {}
        }

        let snapshot = if emit {
            Some(self.entity_snapshot(id)?)
        } else {
            None
        };
        let system = self.system_of(id)?;
        if let Some(handle) = self.registry.remove(id, &system) {
            let _ = self.world.despawn(handle);
        }
        self.stats.removals += 1;
        if let Some(entity) = snapshot {
            self.emit(LevelEvent::EntityRemoved { entity });
        }
        Ok(())
    }

    fn detach_from_fleet(&mut self, owner: &EntityId, ship: &EntityId) {
        let Some(handle) = self.registry.handle(owner) else {
            return;
        };
        if let Ok(mut fleet) = self.world.get::<&mut Fleet>(handle) {
            fleet.ships.retain(|s| s != ship);
        }
    }

    /// Move an entity and its hardpoints to another system.
    pub(crate) fn set_system(&mut self, id: &EntityId, to: &SystemId) -> Result<(), SimError> {
        let handle = self.handle(id)?;
        let from = self.system_of(id)?;
        if let Ok(mut placement) = self.world.get::<&mut Placement>(handle) {
            placement.system = to.clone();
        }
        self.registry.move_system(id, &from, to);
        if let Ok(ship) = self.read::<ShipState>(id) {
            for hardpoint in &ship.hardpoints {
                if self.contains(hardpoint) {
                    self.set_system(hardpoint, to)?;
                }
            }
        }
        Ok(())
    }

    // --- Snapshots of single entities ---

    pub fn entity_snapshot(&self, id: &EntityId) -> Result<EntitySnapshot, SimError> {
        let identity = self.read::<Identity>(id)?;
        let transform = self.read::<Transform>(id)?;
        let relations = self.read::<Relations>(id)?;
        let flags = self.read::<EntityFlags>(id)?;
        let path = self
            .read::<PathQueue>(id)
            .map(|p| p.waypoints.into_iter().collect())
            .unwrap_or_default();

        let data = match identity.kind {
            EntityKind::Star => {
                let body = self.read::<CelestialBody>(id)?;
                EntityData::Star(StarData {
                    radius: body.radius,
                    seed: body.seed,
                    color: self.read::<StarColor>(id)?.0,
                    fleet: self.read::<Fleet>(id)?,
                    rewards: body.rewards,
                })
            }
            EntityKind::Planet => {
                let body = self.read::<CelestialBody>(id)?;
                EntityData::Planet(PlanetData {
                    radius: body.radius,
                    seed: body.seed,
                    biome: self.read::<PlanetSurface>(id)?.biome,
                    fleet: self.read::<Fleet>(id)?,
                    rewards: body.rewards,
                })
            }
            EntityKind::Hardpoint => {
                let hardpoint = self.read::<HardpointState>(id)?;
                EntityData::Hardpoint(HardpointData {
                    hardpoint_type: hardpoint.hardpoint_type,
                    scale: hardpoint.scale,
                    reload: hardpoint.reload,
                    projectiles: hardpoint.projectiles,
                })
            }
            EntityKind::Ship => {
                let ship = self.read::<ShipState>(id)?;
                EntityData::Ship(ShipData {
                    ship_type: ship.ship_type,
                    hp: ship.hp,
                    jump_cooldown: ship.jump_cooldown,
                    storage: ship.storage,
                    hardpoints: ship.hardpoints,
                })
            }
            EntityKind::Player => {
                let player = self.read::<PlayerState>(id)?;
                EntityData::Player(PlayerData {
                    fleet: self.read::<Fleet>(id)?,
                    research: player.research,
                    xp: player.xp,
                    xp_points: player.xp_points,
                })
            }
        };

        Ok(EntitySnapshot {
            id: identity.id,
            name: identity.name,
            system: self.system_of(id)?,
            owner: relations.owner,
            parent: relations.parent,
            position: transform.position,
            rotation: transform.rotation,
            velocity: transform.velocity,
            is_selected: flags.is_selected,
            is_targetable: flags.is_targetable,
            path,
            data,
        })
    }

    // --- Test helpers ---

    /// Mutate a component directly (for tests).
    #[cfg(test)]
    pub(crate) fn with_component<T: hecs::Component, R>(
        &mut self,
        id: &EntityId,
        f: impl FnOnce(&mut T) -> R,
    ) -> R {
        let handle = self.handle(id).expect("entity exists");
        let mut component = self.world.get::<&mut T>(handle).expect("component exists");
        f(&mut *component)
    }
}
