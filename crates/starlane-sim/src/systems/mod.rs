//! Per-tick entity updates.
//!
//! Systems are free functions over the `Level`. Entities update once per
//! tick in master order; an entity removed earlier in the same tick is
//! skipped. Failures are logged and never abort the tick.

pub mod cleanup;
pub mod combat;
pub mod movement;
pub mod projectiles;

use starlane_core::enums::EntityKind;
use starlane_core::types::EntityId;
use starlane_core::SimError;

use crate::level::Level;

/// Update every live entity once.
pub fn run(level: &mut Level) {
    let order: Vec<EntityId> = level.entity_ids().to_vec();
    for id in &order {
        if !level.contains(id) {
            continue;
        }
        if let Err(error) = update_entity(level, id) {
            tracing::warn!(entity = %id, %error, "entity update failed");
        }
    }
}

fn update_entity(level: &mut Level, id: &EntityId) -> Result<(), SimError> {
    let kind = level.kind(id)?;
    movement::run(level, id, kind)?;
    match kind {
        EntityKind::Ship => combat::run(level, id)?,
        EntityKind::Hardpoint => projectiles::run(level, id)?,
        EntityKind::Star | EntityKind::Planet | EntityKind::Player => {}
    }
    level.mark_updated(id);
    Ok(())
}

/// Replica counterpart of `run`: motion and timers only. Shots, hits and
/// deaths reach a replica as events, so nothing here draws randomness or
/// emits.
pub fn mirror(level: &mut Level) {
    let order: Vec<EntityId> = level.entity_ids().to_vec();
    for id in &order {
        if !level.contains(id) {
            continue;
        }
        if let Err(error) = mirror_entity(level, id) {
            tracing::warn!(entity = %id, %error, "replica update failed");
        }
    }
}

fn mirror_entity(level: &mut Level, id: &EntityId) -> Result<(), SimError> {
    let kind = level.kind(id)?;
    movement::run(level, id, kind)?;
    match kind {
        EntityKind::Ship => combat::countdown(level, id)?,
        EntityKind::Hardpoint => {
            projectiles::advance(level, id)?;
        }
        EntityKind::Star | EntityKind::Planet | EntityKind::Player => {}
    }
    Ok(())
}
