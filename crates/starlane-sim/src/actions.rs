//! Action validation and application.
//!
//! `try_action` checks every precondition of an action before it touches
//! state, then applies it in full. Actions queued with `queue_action` are
//! applied the same way at the start of the next tick and leave a receipt.

use std::collections::BTreeMap;

use starlane_core::actions::{
    Action, ActionOutcome, ActionReceipt, ActionRequest, MoveOrder, WarpOrder,
};
use starlane_core::catalog::{
    item_spec, requirements_met, research_locked, research_price, research_spec, ship_recipe,
    ship_spec,
};
use starlane_core::components::{PlayerState, Relations};
use starlane_core::enums::{EntityKind, ItemId, ResearchId, ShipType};
use starlane_core::events::LevelEvent;
use starlane_core::storage::{collect_items, weighted_total, ITEM_EPSILON};
use starlane_core::types::EntityId;
use starlane_core::SimError;

use crate::level::Level;
use crate::random::{random_between, random_on_sphere};

/// Newly built ships appear this far (min, max) from where they are built.
const BUILD_SPREAD: (f64, f64) = (10.0, 50.0);

impl Level {
    /// Queue an action for the next tick boundary. Returns its ticket.
    pub fn queue_action(&mut self, request: ActionRequest) -> u64 {
        let ticket = self.next_ticket();
        self.action_queue.push_back((ticket, request));
        ticket
    }

    /// Apply every queued action in arrival order.
    pub(crate) fn process_actions(&mut self) {
        while let Some((ticket, request)) = self.action_queue.pop_front() {
            let outcome = match self.try_action(&request.issuer, &request.action) {
                Ok(true) => ActionOutcome::Applied,
                Ok(false) => ActionOutcome::Rejected,
                Err(error) => {
                    tracing::warn!(ticket, issuer = %request.issuer, %error, "action failed");
                    ActionOutcome::Failed(error.to_string())
                }
            };
            self.receipts.push(ActionReceipt {
                ticket,
                request,
                outcome,
            });
        }
    }

    /// Validate and apply an action immediately.
    ///
    /// `Ok(false)` means a precondition did not hold; `Err` means the action
    /// referenced something that does not exist. Neither changes state.
    pub fn try_action(&mut self, issuer: &EntityId, action: &Action) -> Result<bool, SimError> {
        if self.kind(issuer)? != EntityKind::Player {
            return Ok(false);
        }
        let applied = match action {
            Action::CreateItem { item } => self.create_item(issuer, *item)?,
            Action::CreateShip { ship, shipyard } => {
                self.create_ship(issuer, *ship, shipyard.as_ref())?
            }
            Action::Research { tech } => self.research(issuer, *tech)?,
            Action::Warp(orders) => self.warp(issuer, orders)?,
            Action::Move(orders) => self.move_ships(issuer, orders)?,
        };
        tracing::debug!(%issuer, ?action, applied, "action");
        Ok(applied)
    }

    fn research_levels(&self, player: &EntityId) -> Result<BTreeMap<ResearchId, u32>, SimError> {
        Ok(self.read::<PlayerState>(player)?.research)
    }

    fn create_item(&mut self, player: &EntityId, item: ItemId) -> Result<bool, SimError> {
        let Some(recipe) = item_spec(item).recipe else {
            return Ok(false);
        };
        let recipe = collect_items(recipe);
        if !self.has_items(player, &recipe)? {
            return Ok(false);
        }
        // The crafted unit must fit once the materials are gone.
        let product = collect_items(&[(item, 1.0)]);
        let (total, max) = self.fleet_capacity(player)?;
        if total - weighted_total(&recipe) + weighted_total(&product) > max + ITEM_EPSILON {
            return Ok(false);
        }

        self.remove_items(player, &recipe)?;
        self.add_items(player, &product)?;
        Ok(true)
    }

    fn create_ship(
        &mut self,
        player: &EntityId,
        ship: ShipType,
        shipyard: Option<&EntityId>,
    ) -> Result<bool, SimError> {
        let research = self.research_levels(player)?;
        let level_of = |tech| research.get(&tech).copied().unwrap_or(0);
        if !requirements_met(ship_spec(ship).requires, level_of) {
            return Ok(false);
        }
        let recipe = ship_recipe(ship);
        if !self.has_items(player, &recipe)? {
            return Ok(false);
        }
        let system = self.system_of(player)?;
        let origin = match shipyard {
            Some(yard) => {
                if self.system_of(yard)? != system {
                    return Ok(false);
                }
                self.absolute_position(yard)?
            }
            None => self.absolute_position(player)?,
        };

        self.remove_items(player, &recipe)?;
        let distance = random_between(&mut self.rng, BUILD_SPREAD.0, BUILD_SPREAD.1);
        let position = origin + random_on_sphere(&mut self.rng, distance, true);
        let id = self.spawn_ship(ship, &system, position, Some(player))?;
        tracing::info!(%player, ship = %id, ship_type = ?ship, "ship built");
        Ok(true)
    }

    fn research(&mut self, player: &EntityId, tech: ResearchId) -> Result<bool, SimError> {
        let research = self.research_levels(player)?;
        let level_of = |tech| research.get(&tech).copied().unwrap_or(0);
        let current = level_of(tech);
        let spec = research_spec(tech);
        if current >= spec.max || research_locked(tech, level_of) {
            return Ok(false);
        }
        let price = research_price(tech, current);
        if !self.has_items(player, &price)? {
            return Ok(false);
        }

        self.remove_items(player, &price)?;
        let handle = self.handle(player)?;
        if let Ok(mut state) = self.world.get::<&mut PlayerState>(handle) {
            state.research.insert(tech, current + 1);
        }
        if tech == ResearchId::Storage {
            self.refresh_capacity(player)?;
        }
        let snapshot = self.entity_snapshot(player)?;
        self.emit(LevelEvent::PlayerUpdate { player: snapshot });
        tracing::info!(%player, ?tech, level = current + 1, "research complete");
        Ok(true)
    }

    /// Whether `id` is a ship the player may command. Unknown ids are errors.
    fn commandable(&self, player: &EntityId, id: &EntityId) -> Result<bool, SimError> {
        if self.kind(id)? != EntityKind::Ship {
            return Ok(false);
        }
        Ok(self.read::<Relations>(id)?.owner.as_ref() == Some(player))
    }

    fn warp(&mut self, player: &EntityId, orders: &[WarpOrder]) -> Result<bool, SimError> {
        for order in orders {
            if !self.commandable(player, &order.id)? {
                return Ok(false);
            }
            if self.system(&order.target).is_none() {
                return Err(SimError::UnknownSystem(order.target.clone()));
            }
        }
        for order in orders {
            // Cooldown or range refusals are per ship and do not fail the action.
            self.jump_to(&order.id, &order.target)?;
        }
        Ok(true)
    }

    fn move_ships(&mut self, player: &EntityId, orders: &[MoveOrder]) -> Result<bool, SimError> {
        for order in orders {
            if !self.commandable(player, &order.id)? {
                return Ok(false);
            }
        }
        for order in orders {
            self.move_to(&order.id, order.target)?;
        }
        Ok(true)
    }
}
