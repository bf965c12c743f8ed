//! Core types and definitions for the Starlane simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! identifiers, catalogs, components, actions, events, snapshot documents,
//! snapshot versions and errors. It has no dependency on any runtime framework.

pub mod actions;
pub mod catalog;
pub mod components;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod snapshot;
pub mod storage;
pub mod types;
pub mod version;

pub use error::{SimError, VersionError};

#[cfg(test)]
mod tests;
