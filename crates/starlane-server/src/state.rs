//! State shared between HTTP handlers and the game loop thread.

use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde::Serialize;

use starlane_core::actions::{ActionReceipt, ActionRequest};
use starlane_core::enums::LevelState;
use starlane_core::snapshot::LevelSnapshot;
use starlane_core::types::EntityId;
use starlane_core::SimError;
use starlane_sim::{Level, TickStats};

use crate::config::{AccessLists, ServerConfig};
use crate::event_log::EventLog;
use crate::session::{AdmissionPolicy, Authenticator, SessionRegistry};

/// Commands sent from the HTTP layer to the game loop thread.
#[derive(Debug)]
pub enum GameLoopCommand {
    /// Spawn the player for an admitted account, unless it already exists.
    Join { player: EntityId, name: String },
    /// Queue an action; the receipt is sent back once the tick applies it.
    Action {
        request: ActionRequest,
        reply: Option<tokio::sync::oneshot::Sender<ActionReceipt>>,
    },
    /// Stop the level, save it if configured, and end the thread.
    Shutdown,
}

/// What the loop publishes after each tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorldView {
    pub state: LevelState,
    pub tick: u64,
    pub tps: f64,
    pub stats: TickStats,
    /// Latest full snapshot and the sequence number of the first event after it.
    pub snapshot: Option<LevelSnapshot>,
    pub sequence: u64,
}

/// Level outputs, written by the game loop and read by handlers.
#[derive(Debug)]
pub struct SharedWorld {
    pub view: Mutex<WorldView>,
    pub log: Mutex<EventLog>,
}

impl SharedWorld {
    /// Publish `level` as it stands. Events emitted so far are covered by the
    /// snapshot, so they are discarded.
    pub fn new(level: &mut Level) -> Result<Self, SimError> {
        let _ = level.drain_events();
        let _ = level.drain_updated();
        let sequence = level.next_sequence();
        let view = WorldView {
            state: level.state(),
            tick: level.time().tick,
            tps: 0.0,
            stats: level.stats(),
            snapshot: Some(level.to_snapshot()?),
            sequence,
        };
        Ok(Self {
            view: Mutex::new(view),
            log: Mutex::new(EventLog::new(sequence)),
        })
    }
}

/// Shared application state, held by the router as `Arc<AppState>`.
pub struct AppState {
    pub config: ServerConfig,
    pub access: Mutex<AccessLists>,
    pub authenticator: Arc<dyn Authenticator>,
    pub sessions: Mutex<SessionRegistry>,
    /// `mpsc::Sender` is wrapped so the state is shareable across handlers.
    pub command_tx: Mutex<mpsc::Sender<GameLoopCommand>>,
    pub world: Arc<SharedWorld>,
    pub started: Instant,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        access: AccessLists,
        authenticator: Arc<dyn Authenticator>,
        command_tx: mpsc::Sender<GameLoopCommand>,
        world: Arc<SharedWorld>,
    ) -> Self {
        let policy = AdmissionPolicy {
            max_clients: config.max_clients,
            whitelist: config.whitelist,
            blacklist: config.blacklist,
        };
        Self {
            config,
            access: Mutex::new(access),
            authenticator,
            sessions: Mutex::new(SessionRegistry::new(policy)),
            command_tx: Mutex::new(command_tx),
            world,
            started: Instant::now(),
        }
    }

    /// Forward a command to the game loop. Fails once the loop has exited.
    pub fn send(&self, command: GameLoopCommand) -> bool {
        lock(&self.command_tx).send(command).is_ok()
    }

    /// Refuse new sessions and ask the loop to stop.
    pub fn begin_shutdown(&self) {
        lock(&self.sessions).set_stopping(true);
        if !self.send(GameLoopCommand::Shutdown) {
            tracing::debug!("game loop already stopped");
        }
    }

    /// Whole seconds since the server started.
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use starlane_sim::LevelConfig;

    use crate::session::LocalAuthenticator;

    #[test]
    fn test_shared_world_starts_at_level_sequence() {
        let mut level = Level::generate(LevelConfig::default()).unwrap();
        let sequence = level.next_sequence();
        assert!(sequence > 0, "generation emits entity_added events");

        let world = SharedWorld::new(&mut level).unwrap();
        let view = lock(&world.view);
        assert_eq!(view.sequence, sequence);
        assert!(view.snapshot.is_some());
        assert!(lock(&world.log).since(sequence).unwrap().is_empty());
        assert!(level.drain_events().is_empty(), "published events are consumed");
    }

    #[test]
    fn test_shutdown_marks_sessions_stopping() {
        let mut level = Level::generate(LevelConfig::default()).unwrap();
        let world = Arc::new(SharedWorld::new(&mut level).unwrap());
        let (tx, rx) = mpsc::channel();
        let state = AppState::new(
            ServerConfig::default(),
            AccessLists::default(),
            Arc::new(LocalAuthenticator),
            tx,
            world,
        );

        state.begin_shutdown();
        assert!(lock(&state.sessions).is_stopping());
        assert!(matches!(rx.try_recv(), Ok(GameLoopCommand::Shutdown)));
    }
}
