//! Projectile flight and hit resolution.
//!
//! Projectiles are not entities. They live on the hardpoint that fired them,
//! fly in a straight line and land on their target once their tick budget
//! runs out. A hit on a hardpoint damages the ship carrying it.

use starlane_core::components::{HardpointState, Projectile, Relations, ShipState};
use starlane_core::enums::EntityKind;
use starlane_core::events::LevelEvent;
use starlane_core::types::EntityId;
use starlane_core::SimError;

use crate::level::{Level, PendingDeath};

pub fn run(level: &mut Level, hardpoint: &EntityId) -> Result<(), SimError> {
    let arrived = advance(level, hardpoint)?;
    if arrived.is_empty() {
        return Ok(());
    }

    let shooter = level.read::<Relations>(hardpoint)?.parent;
    for projectile in &arrived {
        resolve_hit(level, hardpoint, shooter.as_ref(), projectile)?;
    }
    Ok(())
}

/// Move every projectile of `hardpoint` one tick and take out the ones that
/// arrived.
pub fn advance(level: &mut Level, hardpoint: &EntityId) -> Result<Vec<Projectile>, SimError> {
    let handle = level.handle(hardpoint)?;
    let mut state = level
        .world
        .get::<&mut HardpointState>(handle)
        .map_err(|_| SimError::UnknownEntity(hardpoint.clone()))?;
    let mut arrived = Vec::new();
    state.projectiles.retain_mut(|projectile| {
        projectile.position += projectile.velocity;
        projectile.ticks_remaining = projectile.ticks_remaining.saturating_sub(1);
        if projectile.ticks_remaining == 0 {
            arrived.push(projectile.clone());
            false
        } else {
            true
        }
    });
    Ok(arrived)
}

fn resolve_hit(
    level: &mut Level,
    hardpoint: &EntityId,
    shooter: Option<&EntityId>,
    projectile: &Projectile,
) -> Result<(), SimError> {
    // The target may have died or jumped away while the projectile flew.
    let Ok(kind) = level.kind(&projectile.target) else {
        return Ok(());
    };
    let ship = match kind {
        EntityKind::Ship => projectile.target.clone(),
        EntityKind::Hardpoint => match level.read::<Relations>(&projectile.target)?.parent {
            Some(parent) => parent,
            None => return Ok(()),
        },
        _ => return Ok(()),
    };
    if !level.contains(&ship) || level.system_of(&ship)? != level.system_of(hardpoint)? {
        return Ok(());
    }

    let handle = level.handle(&ship)?;
    let hp = {
        let mut state = level
            .world
            .get::<&mut ShipState>(handle)
            .map_err(|_| SimError::UnknownEntity(ship.clone()))?;
        if state.hp <= 0.0 {
            return Ok(());
        }
        state.hp -= projectile.damage;
        state.hp
    };
    level.mark_updated(&ship);
    level.emit(LevelEvent::EntityHit {
        entity: ship.clone(),
        hardpoint: hardpoint.clone(),
        damage: projectile.damage,
        hp,
    });
    let lethal = hp <= 0.0;

    if lethal {
        let beneficiary = match shooter {
            Some(shooter) => level.read::<Relations>(shooter).ok().and_then(|r| r.owner),
            None => None,
        };
        tracing::debug!(victim = %ship, killer = ?shooter, "ship destroyed");
        level.pending_deaths.push(PendingDeath {
            victim: ship,
            killer: shooter.cloned(),
            beneficiary,
        });
    }
    Ok(())
}
