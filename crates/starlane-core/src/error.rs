//! Error taxonomy for the simulation.
//!
//! Validation failures are not errors: they surface as `Ok(false)`.

use crate::enums::{EntityKind, LevelState};
use crate::types::{EntityId, SystemId};

/// Reference, data-integrity and I/O failures.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),

    #[error("unknown system: {0}")]
    UnknownSystem(SystemId),

    #[error("entity {id} is not a {expected:?}")]
    WrongEntityType { id: EntityId, expected: EntityKind },

    #[error("duplicate entity id: {0}")]
    DuplicateEntity(EntityId),

    #[error("duplicate system id: {0}")]
    DuplicateSystem(SystemId),

    /// A reference that no loaded entity claims or provides.
    #[error("entity {id} has unresolved reference to {reference}")]
    UnresolvedReference { id: EntityId, reference: EntityId },

    #[error("invalid entity selector: {0:?}")]
    InvalidSelector(String),

    #[error("cannot transition level from {from:?} to {to:?}")]
    InvalidTransition { from: LevelState, to: LevelState },

    #[error("event sequence gap: expected {expected}, got {got}")]
    SequenceGap { expected: u64, got: u64 },

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),
}

/// Snapshot version problems. Fatal to the load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("unknown snapshot version {0:?}")]
    Unknown(String),

    #[error("snapshot version {0:?} can not be upgraded")]
    Unsupported(String),

    #[error("snapshot has no version tag")]
    Missing,
}
