//! Ship upkeep and weapon targeting.
//!
//! Each tick a live ship counts down its jump cooldown and every mounted
//! hardpoint its reload. A loaded hardpoint picks the nearest hostile
//! targetable entity in range of the ship, then aims at whichever part of
//! that ship (hull or hardpoint) is nearest to the weapon.

use glam::DVec3;
use rand::Rng;

use starlane_core::catalog::{hardpoint_spec, HardpointSpec};
use starlane_core::components::{
    EntityFlags, HardpointState, Identity, Projectile, Relations, ShipState,
};
use starlane_core::enums::EntityKind;
use starlane_core::events::LevelEvent;
use starlane_core::types::{EntityId, SystemId};
use starlane_core::SimError;

use crate::level::Level;
use crate::random::{random_between, random_on_sphere};

/// An entity a weapon could aim at.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetCandidate {
    pub id: EntityId,
    pub kind: EntityKind,
    pub owner: Option<EntityId>,
    pub position: DVec3,
}

pub fn run(level: &mut Level, id: &EntityId) -> Result<(), SimError> {
    let (hp, hardpoints) = cool_down(level, id)?;
    // Dead ships wait for cleanup.
    if hp <= 0.0 {
        return Ok(());
    }

    let owner = level.read::<Relations>(id)?.owner;
    let system = level.system_of(id)?;
    let origin = level.absolute_position(id)?;
    let mut candidates: Option<Vec<TargetCandidate>> = None;

    for hardpoint in &hardpoints {
        let Some(spec) = reload(level, hardpoint) else {
            continue;
        };
        if candidates.is_none() {
            candidates = Some(target_candidates(level, &system)?);
        }
        let Some(candidates) = candidates.as_deref() else {
            continue;
        };
        let Some(target) = nearest_target(candidates, owner.as_ref(), origin, spec.range) else {
            continue;
        };
        if target.kind != EntityKind::Ship {
            continue;
        }
        let target = target.id.clone();
        let muzzle = level.absolute_position(hardpoint)?;
        let Some((aim_id, aim)) = sub_target(level, &target, muzzle, spec.range)? else {
            continue;
        };
        fire(level, hardpoint, aim_id, muzzle, aim, &spec)?;
    }
    Ok(())
}

/// Timer upkeep without targeting: the jump cooldown and, on a live ship,
/// every reload. Replicas use this since their shots arrive as events.
pub fn countdown(level: &mut Level, id: &EntityId) -> Result<(), SimError> {
    let (hp, hardpoints) = cool_down(level, id)?;
    if hp <= 0.0 {
        return Ok(());
    }
    for hardpoint in &hardpoints {
        reload(level, hardpoint);
    }
    Ok(())
}

fn cool_down(level: &mut Level, id: &EntityId) -> Result<(f64, Vec<EntityId>), SimError> {
    let handle = level.handle(id)?;
    let mut ship = level
        .world
        .get::<&mut ShipState>(handle)
        .map_err(|_| SimError::UnknownEntity(id.clone()))?;
    ship.jump_cooldown = ship.jump_cooldown.saturating_sub(1);
    Ok((ship.hp, ship.hardpoints.clone()))
}

/// Count down the reload of a hardpoint. Returns its spec once loaded.
fn reload(level: &mut Level, hardpoint: &EntityId) -> Option<HardpointSpec> {
    let handle = level.registry.handle(hardpoint)?;
    let mut state = level.world.get::<&mut HardpointState>(handle).ok()?;
    state.reload = state.reload.saturating_sub(1);
    (state.reload == 0).then(|| hardpoint_spec(state.hardpoint_type))
}

/// Targetable entities of a system, in master order. Dead ships are left out.
pub fn target_candidates(level: &Level, system: &SystemId) -> Result<Vec<TargetCandidate>, SimError> {
    let mut candidates = Vec::new();
    for id in level.system_members(system) {
        let handle = level.handle(id)?;
        let targetable = level
            .world
            .get::<&EntityFlags>(handle)
            .map(|flags| flags.is_targetable)
            .unwrap_or(false);
        if !targetable {
            continue;
        }
        if let Ok(ship) = level.world.get::<&ShipState>(handle) {
            if ship.hp <= 0.0 {
                continue;
            }
        }
        let kind = level
            .world
            .get::<&Identity>(handle)
            .map(|identity| identity.kind)
            .map_err(|_| SimError::UnknownEntity(id.clone()))?;
        candidates.push(TargetCandidate {
            id: id.clone(),
            kind,
            owner: level.read::<Relations>(id)?.owner,
            position: level.absolute_position(id)?,
        });
    }
    Ok(candidates)
}

/// The hostile candidate nearest to `origin` and strictly within `range`.
/// Ties go to the candidate listed first.
pub fn nearest_target<'a>(
    candidates: &'a [TargetCandidate],
    owner: Option<&EntityId>,
    origin: DVec3,
    range: f64,
) -> Option<&'a TargetCandidate> {
    let mut best: Option<(&TargetCandidate, f64)> = None;
    for candidate in candidates {
        if candidate.owner.as_ref() == owner {
            continue;
        }
        let distance = origin.distance(candidate.position);
        if distance >= range {
            continue;
        }
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((candidate, distance));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// The part of `ship` nearest to `muzzle` within range: the hull first, then
/// each hardpoint in slot order.
fn sub_target(
    level: &Level,
    ship: &EntityId,
    muzzle: DVec3,
    range: f64,
) -> Result<Option<(EntityId, DVec3)>, SimError> {
    let state = level.read::<ShipState>(ship)?;
    let mut best: Option<(EntityId, DVec3, f64)> = None;
    let parts = std::iter::once(ship).chain(state.hardpoints.iter());
    for part in parts {
        if !level.contains(part) {
            continue;
        }
        let position = level.absolute_position(part)?;
        let distance = muzzle.distance(position);
        if distance >= range {
            continue;
        }
        if best.as_ref().map_or(true, |(_, _, d)| distance < *d) {
            best = Some((part.clone(), position, distance));
        }
    }
    Ok(best.map(|(id, position, _)| (id, position)))
}

fn fire(
    level: &mut Level,
    hardpoint: &EntityId,
    target: EntityId,
    muzzle: DVec3,
    aim: DVec3,
    spec: &HardpointSpec,
) -> Result<(), SimError> {
    let speed = spec.projectile.speed;
    let spread = random_between(&mut level.rng, 0.0, 1.0 / spec.accuracy);
    let offset = random_on_sphere(&mut level.rng, spread, false);
    let mut direction = (aim + offset - muzzle).normalize_or_zero();
    if direction == DVec3::ZERO {
        direction = (aim - muzzle).normalize_or_zero();
    }
    let ticks = ((muzzle.distance(aim) / speed).ceil() as u32).max(1);
    let critical = level.rng.gen_bool(spec.crit_chance.clamp(0.0, 1.0));
    let damage = if critical {
        spec.damage * spec.crit_factor
    } else {
        spec.damage
    };
    let projectile = Projectile {
        id: level.new_entity_id(),
        target: target.clone(),
        position: muzzle,
        velocity: direction * speed,
        ticks_remaining: ticks,
        damage,
        critical,
    };

    let handle = level.handle(hardpoint)?;
    {
        let mut state = level
            .world
            .get::<&mut HardpointState>(handle)
            .map_err(|_| SimError::UnknownEntity(hardpoint.clone()))?;
        state.reload = spec.reload;
        state.projectiles.push(projectile.clone());
    }
    tracing::trace!(%hardpoint, %target, critical, "projectile fired");
    level.emit(LevelEvent::ProjectileFire {
        hardpoint: hardpoint.clone(),
        target,
        projectile: projectile.id,
        position: projectile.position,
        velocity: projectile.velocity,
        ticks,
        damage,
        critical,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, owner: Option<&str>, x: f64) -> TargetCandidate {
        TargetCandidate {
            id: EntityId::from(id),
            kind: EntityKind::Ship,
            owner: owner.map(EntityId::from),
            position: DVec3::new(x, 0.0, 0.0),
        }
    }

    #[test]
    fn test_nearest_hostile_in_range() {
        let me = EntityId::from("me");
        let candidates = vec![
            candidate("a", Some("enemy"), 150.0),
            candidate("b", Some("me"), 10.0),
            candidate("c", Some("enemy"), 50.0),
            candidate("d", Some("enemy"), 500.0),
        ];
        let target = nearest_target(&candidates, Some(&me), DVec3::ZERO, 200.0).unwrap();
        assert_eq!(target.id, EntityId::from("c"));
    }

    #[test]
    fn test_ties_keep_first_listed() {
        let candidates = vec![
            candidate("first", None, 20.0),
            candidate("second", None, -20.0),
        ];
        let me = EntityId::from("me");
        let target = nearest_target(&candidates, Some(&me), DVec3::ZERO, 200.0).unwrap();
        assert_eq!(target.id, EntityId::from("first"));
    }

    #[test]
    fn test_range_is_exclusive() {
        let candidates = vec![candidate("edge", None, 200.0)];
        let me = EntityId::from("me");
        assert!(nearest_target(&candidates, Some(&me), DVec3::ZERO, 200.0).is_none());
    }

    #[test]
    fn test_unowned_shooter_ignores_unowned_targets() {
        let candidates = vec![candidate("wild", None, 5.0)];
        assert!(nearest_target(&candidates, None, DVec3::ZERO, 200.0).is_none());
    }
}
