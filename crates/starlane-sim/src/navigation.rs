//! In-system movement and hyperspace jumps.

use std::collections::VecDeque;

use glam::DVec3;

use starlane_core::catalog::ship_spec;
use starlane_core::components::{PathQueue, ShipState, Transform};
use starlane_core::enums::EntityKind;
use starlane_core::events::LevelEvent;
use starlane_core::types::{look_rotation, EntityId, SystemId};
use starlane_core::SimError;

use crate::level::Level;
use crate::pathfinding::find_path;

impl Level {
    /// Start following an obstacle-avoiding path to `target`.
    ///
    /// Emits `entity_path_start` with the full waypoint list (start included).
    /// The entity itself follows the same list, minus its starting point.
    pub fn move_to(&mut self, id: &EntityId, target: DVec3) -> Result<Vec<DVec3>, SimError> {
        let handle = self.handle(id)?;
        if self.world.get::<&PathQueue>(handle).is_err() {
            return Err(SimError::WrongEntityType {
                id: id.clone(),
                expected: EntityKind::Ship,
            });
        }
        let start = self.absolute_position(id)?;
        let system = self.system_of(id)?;
        let obstacles = self.obstacles_in(&system, Some(id));
        let path = find_path(start, target, &obstacles);
        if path.is_empty() {
            return Ok(path);
        }

        self.install_path(id, &path)?;
        self.emit(LevelEvent::EntityPathStart {
            entity: id.clone(),
            waypoints: path.clone(),
        });
        Ok(path)
    }

    /// Hyperspace jump. Fails (false) while on cooldown, when the target is
    /// beyond jump range, or when the ship is already there.
    pub fn jump_to(&mut self, id: &EntityId, target: &SystemId) -> Result<bool, SimError> {
        let ship = self.read::<ShipState>(id)?;
        let from_id = self.system_of(id)?;
        let from = self
            .system(&from_id)
            .ok_or_else(|| SimError::UnknownSystem(from_id.clone()))?;
        let to = self
            .system(target)
            .ok_or_else(|| SimError::UnknownSystem(target.clone()))?;

        let spec = ship_spec(ship.ship_type);
        if ship.jump_cooldown > 0 || from_id == *target || from.distance_to(to) > spec.jump_range {
            tracing::debug!(ship = %id, %target, cooldown = ship.jump_cooldown, "jump refused");
            return Ok(false);
        }

        self.complete_jump(id, target, spec.jump_cooldown)?;
        self.emit(LevelEvent::EntityJump {
            entity: id.clone(),
            from: from_id,
            to: target.clone(),
        });
        Ok(true)
    }

    /// Follow `path`, whose first point is the current position.
    pub(crate) fn install_path(&mut self, id: &EntityId, path: &[DVec3]) -> Result<(), SimError> {
        let handle = self.handle(id)?;
        let Some(start) = path.first().copied() else {
            return Ok(());
        };
        let waypoints: VecDeque<DVec3> = path.iter().skip(1).copied().collect();
        if let Some(rotation) = waypoints.front().and_then(|next| look_rotation(start, *next)) {
            if let Ok(mut transform) = self.world.get::<&mut Transform>(handle) {
                transform.rotation = rotation;
            }
        }
        if let Ok(mut queue) = self.world.get::<&mut PathQueue>(handle) {
            queue.waypoints = waypoints;
        }
        Ok(())
    }

    /// Arrive in `to`: start the cooldown and drop any in-system motion.
    pub(crate) fn complete_jump(
        &mut self,
        id: &EntityId,
        to: &SystemId,
        cooldown: u32,
    ) -> Result<(), SimError> {
        self.set_system(id, to)?;
        let handle = self.handle(id)?;
        if let Ok(mut state) = self.world.get::<&mut ShipState>(handle) {
            state.jump_cooldown = cooldown;
        }
        if let Ok(mut queue) = self.world.get::<&mut PathQueue>(handle) {
            queue.waypoints.clear();
        }
        if let Ok(mut transform) = self.world.get::<&mut Transform>(handle) {
            transform.velocity = DVec3::ZERO;
        }
        Ok(())
    }
}
