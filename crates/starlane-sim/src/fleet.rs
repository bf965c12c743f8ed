//! Fleet aggregates and fleet-wide item storage.
//!
//! A fleet is not an entity: it is the `Fleet` component of its owner (a
//! player or celestial body). Player storage is the aggregate of the fleet's
//! ship storage.

use hecs::Entity;

use starlane_core::catalog::{item_spec, ship_spec};
use starlane_core::components::{Fleet, PlayerState, ShipState};
use starlane_core::constants::STORAGE_RESEARCH_DIVISOR;
use starlane_core::enums::{ResearchId, ShipType};
use starlane_core::events::{LevelEvent, ShipHolding};
use starlane_core::storage::{covers, ItemCollection, ITEM_EPSILON};
use starlane_core::types::EntityId;
use starlane_core::SimError;

use crate::level::Level;

impl Level {
    fn fleet_handles(&self, owner: &EntityId) -> Result<Vec<(EntityId, Entity)>, SimError> {
        let fleet = self.read::<Fleet>(owner)?;
        Ok(fleet
            .ships
            .into_iter()
            .filter_map(|id| self.registry.handle(&id).map(|handle| (id, handle)))
            .collect())
    }

    /// Aggregate item holdings across the owner's fleet.
    pub fn fleet_items(&self, owner: &EntityId) -> Result<ItemCollection, SimError> {
        let mut items = ItemCollection::new();
        for (_, handle) in self.fleet_handles(owner)? {
            if let Ok(ship) = self.world.get::<&ShipState>(handle) {
                for (item, amount) in &ship.storage.items {
                    *items.entry(*item).or_insert(0.0) += amount;
                }
            }
        }
        Ok(items)
    }

    /// `(total, max)` weighted storage across the owner's fleet.
    pub fn fleet_capacity(&self, owner: &EntityId) -> Result<(f64, f64), SimError> {
        let mut total = 0.0;
        let mut max = 0.0;
        for (_, handle) in self.fleet_handles(owner)? {
            if let Ok(ship) = self.world.get::<&ShipState>(handle) {
                total += ship.storage.total();
                max += ship.storage.max;
            }
        }
        Ok((total, max))
    }

    /// Sum of ship power in the owner's fleet.
    pub fn fleet_power(&self, owner: &EntityId) -> Result<f64, SimError> {
        let mut power = 0.0;
        for (_, handle) in self.fleet_handles(owner)? {
            if let Ok(ship) = self.world.get::<&ShipState>(handle) {
                power += ship_spec(ship.ship_type).power;
            }
        }
        Ok(power)
    }

    pub fn has_items(&self, owner: &EntityId, items: &ItemCollection) -> Result<bool, SimError> {
        Ok(covers(&self.fleet_items(owner)?, items))
    }

    /// Spread items over the fleet in proportion to each ship's free space.
    /// Returns whatever did not fit.
    pub fn add_items(
        &mut self,
        owner: &EntityId,
        items: &ItemCollection,
    ) -> Result<ItemCollection, SimError> {
        let ships = self.fleet_handles(owner)?;
        let mut overflow = ItemCollection::new();

        for (&item, &amount) in items {
            if amount <= 0.0 {
                continue;
            }
            let weight = item_spec(item).weight.max(f64::EPSILON);
            let free: Vec<f64> = ships
                .iter()
                .map(|(_, handle)| {
                    self.world
                        .get::<&ShipState>(*handle)
                        .map(|ship| ship.storage.free())
                        .unwrap_or(0.0)
                })
                .collect();
            let total_free: f64 = free.iter().sum();

            let mut stored = 0.0;
            if total_free > 0.0 {
                let storable = (amount * weight).min(total_free);
                for ((_, handle), space) in ships.iter().zip(&free) {
                    if *space <= 0.0 {
                        continue;
                    }
                    let share = storable * space / total_free / weight;
                    if let Ok(mut ship) = self.world.get::<&mut ShipState>(*handle) {
                        stored += ship.storage.add(item, share);
                    }
                }
            }
            if amount - stored > ITEM_EPSILON {
                overflow.insert(item, amount - stored);
            }
        }

        self.emit_fleet_change(owner)?;
        Ok(overflow)
    }

    /// Take items from the fleet in proportion to what each ship holds.
    /// Callers check `has_items` first; shortfalls are taken as far as possible.
    pub fn remove_items(&mut self, owner: &EntityId, items: &ItemCollection) -> Result<(), SimError> {
        let ships = self.fleet_handles(owner)?;

        for (&item, &amount) in items {
            if amount <= 0.0 {
                continue;
            }
            let held: Vec<f64> = ships
                .iter()
                .map(|(_, handle)| {
                    self.world
                        .get::<&ShipState>(*handle)
                        .map(|ship| ship.storage.count(item))
                        .unwrap_or(0.0)
                })
                .collect();
            let total_held: f64 = held.iter().sum();
            if total_held <= 0.0 {
                continue;
            }
            let wanted = amount.min(total_held);
            let last = held.iter().rposition(|h| *h > 0.0).unwrap_or(0);

            let mut taken = 0.0;
            for (index, ((_, handle), count)) in ships.iter().zip(&held).enumerate() {
                if *count <= 0.0 {
                    continue;
                }
                let share = if index == last {
                    wanted - taken
                } else {
                    wanted * count / total_held
                };
                if let Ok(mut ship) = self.world.get::<&mut ShipState>(*handle) {
                    taken += ship.storage.remove(item, share);
                }
            }
        }

        self.emit_fleet_change(owner)?;
        Ok(())
    }

    /// Empty every ship in the owner's fleet.
    pub(crate) fn clear_fleet_storage(&mut self, owner: &EntityId) -> Result<(), SimError> {
        for (_, handle) in self.fleet_handles(owner)? {
            if let Ok(mut ship) = self.world.get::<&mut ShipState>(handle) {
                ship.storage.clear();
            }
        }
        self.emit_fleet_change(owner)
    }

    fn emit_fleet_change(&mut self, owner: &EntityId) -> Result<(), SimError> {
        let fleet = self.read::<Fleet>(owner)?;
        let items = self.fleet_items(owner)?;
        let holdings = self
            .fleet_handles(owner)?
            .into_iter()
            .filter_map(|(ship, handle)| {
                self.world
                    .get::<&ShipState>(handle)
                    .ok()
                    .map(|state| ShipHolding {
                        ship,
                        storage: state.storage.clone(),
                    })
            })
            .collect();
        self.emit(LevelEvent::FleetItemsChange {
            owner: owner.clone(),
            fleet,
            items,
            holdings,
        });
        Ok(())
    }

    /// Recompute ship capacities for a fleet. Player fleets gain capacity from
    /// storage research.
    pub(crate) fn refresh_capacity(&mut self, owner: &EntityId) -> Result<(), SimError> {
        let multiplier = match self.read::<PlayerState>(owner) {
            Ok(player) => {
                let level = player.research.get(&ResearchId::Storage).copied().unwrap_or(0);
                1.0 + f64::from(level) / STORAGE_RESEARCH_DIVISOR
            }
            Err(_) => 1.0,
        };
        for (_, handle) in self.fleet_handles(owner)? {
            if let Ok(mut ship) = self.world.get::<&mut ShipState>(handle) {
                ship.storage.max = ship_spec(ship.ship_type).storage * multiplier;
            }
        }
        Ok(())
    }
}

/// Ship types of the owner's fleet, in fleet order.
pub fn fleet_composition(level: &Level, owner: &EntityId) -> Result<Vec<ShipType>, SimError> {
    let fleet = level.read::<Fleet>(owner)?;
    fleet
        .ships
        .iter()
        .map(|id| level.read::<ShipState>(id).map(|ship| ship.ship_type))
        .collect()
}
