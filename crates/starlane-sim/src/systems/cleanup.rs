//! Cleanup system: destroys ships that ran out of hp.
//!
//! Runs after every entity has updated. Each destroyed ship emits
//! `entity_death`, pays its build recipe to whoever owns the killer and is
//! then removed together with its hardpoints.

use starlane_core::catalog::{ship_recipe, ship_spec};
use starlane_core::components::{CelestialBody, ShipState};
use starlane_core::enums::{EntityKind, ShipType};
use starlane_core::events::LevelEvent;
use starlane_core::types::EntityId;
use starlane_core::SimError;

use crate::level::{Level, PendingDeath};

pub fn run(level: &mut Level) {
    let mut deaths = std::mem::take(&mut level.pending_deaths);

    // Ships can also reach zero hp outside combat, e.g. from a loaded save.
    for id in level.entity_ids() {
        if deaths.iter().any(|death| &death.victim == id) {
            continue;
        }
        if let Ok(ship) = level.read::<ShipState>(id) {
            if ship.hp <= 0.0 {
                deaths.push(PendingDeath {
                    victim: id.clone(),
                    killer: None,
                    beneficiary: None,
                });
            }
        }
    }

    for death in deaths {
        if !level.contains(&death.victim) {
            continue;
        }
        if let Err(error) = destroy_ship(level, &death) {
            tracing::warn!(ship = %death.victim, %error, "ship cleanup failed");
        }
    }
}

fn destroy_ship(level: &mut Level, death: &PendingDeath) -> Result<(), SimError> {
    let ship_type = level.read::<ShipState>(&death.victim)?.ship_type;
    let entity = level.entity_snapshot(&death.victim)?;
    level.emit(LevelEvent::EntityDeath {
        entity,
        killer: death.killer.clone(),
    });
    if let Some(beneficiary) = &death.beneficiary {
        award_kill(level, beneficiary, ship_type)?;
    }
    level.remove_entity(&death.victim)
}

/// Players collect the wreck into their fleet and gain xp. Celestial bodies
/// bank it as rewards.
fn award_kill(level: &mut Level, beneficiary: &EntityId, victim: ShipType) -> Result<(), SimError> {
    if !level.contains(beneficiary) {
        return Ok(());
    }
    let loot = ship_recipe(victim);
    match level.kind(beneficiary)? {
        EntityKind::Player => {
            level.add_items(beneficiary, &loot)?;
            level.grant_xp(beneficiary, ship_spec(victim).xp)?;
        }
        EntityKind::Star | EntityKind::Planet => {
            let handle = level.handle(beneficiary)?;
            let rewards = {
                let mut body = level
                    .world
                    .get::<&mut CelestialBody>(handle)
                    .map_err(|_| SimError::UnknownEntity(beneficiary.clone()))?;
                for (item, amount) in &loot {
                    body.rewards.add(*item, *amount);
                }
                body.rewards.clone()
            };
            level.emit(LevelEvent::RewardsChange {
                owner: beneficiary.clone(),
                rewards,
            });
        }
        EntityKind::Ship | EntityKind::Hardpoint => {}
    }
    Ok(())
}
