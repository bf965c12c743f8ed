//! Starlane multiplayer host.
//!
//! Runs one authoritative level on a fixed-rate thread and exposes a small
//! HTTP surface for status, session admission, actions and resync.

pub mod config;
pub mod error;
pub mod event_log;
pub mod game_loop;
pub mod http;
pub mod server;
pub mod session;
pub mod state;

pub use server::{run, run_with_config};
pub use starlane_sim as sim;
