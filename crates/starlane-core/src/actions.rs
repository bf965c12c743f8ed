//! Player actions submitted to the level.
//!
//! Actions are untrusted. The level validates every precondition before it
//! mutates anything, so a rejected action leaves state untouched.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::{ItemId, ResearchId, ShipType};
use crate::types::{EntityId, SystemId};

/// All possible player intents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Action {
    /// Craft one unit of an item from its recipe.
    CreateItem { item: ItemId },
    /// Build a ship, optionally at a shipyard entity's position.
    CreateShip {
        ship: ShipType,
        #[serde(default)]
        shipyard: Option<EntityId>,
    },
    /// Advance a tech by one level.
    Research { tech: ResearchId },
    /// Hyperspace jumps for fleet ships.
    Warp(Vec<WarpOrder>),
    /// In-system moves for fleet ships.
    Move(Vec<MoveOrder>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarpOrder {
    pub id: EntityId,
    pub target: SystemId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveOrder {
    pub id: EntityId,
    pub target: DVec3,
}

/// An action together with the player issuing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub issuer: EntityId,
    pub action: Action,
}

/// Result of an action applied at a tick boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ActionOutcome {
    Applied,
    Rejected,
    /// A reference or data error; the message is for logs only.
    Failed(String),
}

impl ActionOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, ActionOutcome::Applied)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReceipt {
    pub ticket: u64,
    pub request: ActionRequest,
    pub outcome: ActionOutcome,
}
