//! Player experience, levels and resets.

use starlane_core::catalog::xp_to_level;
use starlane_core::components::{Fleet, PlayerState};
use starlane_core::enums::EntityKind;
use starlane_core::events::LevelEvent;
use starlane_core::types::EntityId;
use starlane_core::SimError;

use crate::level::Level;

impl Level {
    /// Add xp to a player. Every whole level gained grants one xp point and
    /// emits `player_levelup`; smaller gains emit `player_update`. Returns the
    /// number of levels gained.
    pub fn grant_xp(&mut self, player: &EntityId, xp: f64) -> Result<u32, SimError> {
        let handle = self.expect_kind(player, EntityKind::Player)?;
        let gained = {
            let mut state = self
                .world
                .get::<&mut PlayerState>(handle)
                .map_err(|_| SimError::UnknownEntity(player.clone()))?;
            let before = xp_to_level(state.xp).floor();
            state.xp += xp.max(0.0);
            let after = xp_to_level(state.xp).floor();
            let gained = (after - before).max(0.0) as u32;
            state.xp_points += gained;
            gained
        };
        let snapshot = self.entity_snapshot(player)?;
        if gained > 0 {
            tracing::info!(%player, levels = gained, "player level up");
            self.emit(LevelEvent::PlayerLevelup { player: snapshot });
        } else {
            self.emit(LevelEvent::PlayerUpdate { player: snapshot });
        }
        Ok(gained)
    }

    /// Wipe a player's progress: storage, research and every ship.
    /// The player entity itself survives.
    pub fn reset_player(&mut self, player: &EntityId) -> Result<(), SimError> {
        let handle = self.expect_kind(player, EntityKind::Player)?;
        self.clear_fleet_storage(player)?;
        if let Ok(mut state) = self.world.get::<&mut PlayerState>(handle) {
            state.research.clear();
        }
        let fleet = self.read::<Fleet>(player)?;
        for ship in &fleet.ships {
            if self.contains(ship) {
                self.remove_entity(ship)?;
            }
        }
        tracing::info!(%player, "player reset");
        let snapshot = self.entity_snapshot(player)?;
        self.emit(LevelEvent::PlayerReset { player: snapshot });
        Ok(())
    }
}
