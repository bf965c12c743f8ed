//! Game loop thread: runs the level at 30Hz and publishes its outputs.
//!
//! The level moves into this thread and is never shared. Commands arrive via
//! an `mpsc` channel and are applied at tick boundaries, so two commands for
//! the same ship always resolve in arrival order. Events go to the shared log;
//! the snapshot is refreshed once per second.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use tokio::sync::oneshot;

use starlane_core::actions::ActionReceipt;
use starlane_core::enums::LevelState;
use starlane_core::types::EntityId;
use starlane_sim::Level;

use crate::config::{SNAPSHOT_INTERVAL_TICKS, TICK_DURATION};
use crate::state::{lock, GameLoopCommand, SharedWorld};

/// Spawns the game loop in a new thread.
///
/// Returns the command sender for the HTTP layer and the thread handle.
pub fn spawn_game_loop(
    level: Level,
    world: Arc<SharedWorld>,
    save_path: Option<PathBuf>,
) -> io::Result<(mpsc::Sender<GameLoopCommand>, JoinHandle<()>)> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<GameLoopCommand>();

    let handle = std::thread::Builder::new()
        .name("starlane-game-loop".into())
        .spawn(move || {
            run_game_loop(level, cmd_rx, &world, save_path);
        })?;

    Ok((cmd_tx, handle))
}

/// The game loop. Runs until Shutdown command or channel disconnect.
fn run_game_loop(
    mut level: Level,
    cmd_rx: mpsc::Receiver<GameLoopCommand>,
    world: &SharedWorld,
    save_path: Option<PathBuf>,
) {
    let mut replies: HashMap<u64, oneshot::Sender<ActionReceipt>> = HashMap::new();
    let mut frame: u64 = 0;
    let mut next_tick_time = Instant::now();
    tracing::info!(level = %level.id(), "game loop started");

    loop {
        // 1. Drain all pending commands
        loop {
            match cmd_rx.try_recv() {
                Ok(command) => {
                    if !apply_command(&mut level, command, &mut replies) {
                        shutdown(&mut level, world, save_path.as_ref());
                        return;
                    }
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    shutdown(&mut level, world, save_path.as_ref());
                    return;
                }
            }
        }

        // 2. Advance one tick; queued actions apply first
        level.tick();
        for receipt in level.drain_receipts() {
            if let Some(reply) = replies.remove(&receipt.ticket) {
                let _ = reply.send(receipt);
            }
        }

        // 3. Publish events every tick, the snapshot on an interval
        frame += 1;
        publish(&mut level, world, frame % SNAPSHOT_INTERVAL_TICKS == 0);

        // 4. Sleep until next tick
        next_tick_time += TICK_DURATION;
        let now = Instant::now();
        if next_tick_time > now {
            std::thread::sleep(next_tick_time - now);
        } else if now - next_tick_time > TICK_DURATION * 2 {
            // Too far behind, reset to avoid catch-up spiral
            tracing::debug!(behind_ms = (now - next_tick_time).as_millis() as u64, "tick overrun");
            next_tick_time = now;
        }
    }
}

/// Apply one command. Returns false when the loop should stop.
fn apply_command(
    level: &mut Level,
    command: GameLoopCommand,
    replies: &mut HashMap<u64, oneshot::Sender<ActionReceipt>>,
) -> bool {
    match command {
        GameLoopCommand::Join { player, name } => {
            join(level, player, &name);
            true
        }
        GameLoopCommand::Action { request, reply } => {
            let ticket = level.queue_action(request);
            if let Some(reply) = reply {
                replies.insert(ticket, reply);
            }
            true
        }
        GameLoopCommand::Shutdown => false,
    }
}

fn join(level: &mut Level, player: EntityId, name: &str) {
    if level.contains(&player) {
        tracing::debug!(%player, "player resumed");
        return;
    }
    if let Err(error) = level.spawn_player(player.clone(), name) {
        tracing::warn!(%player, %error, "failed to spawn player");
    }
}

fn publish(level: &mut Level, world: &SharedWorld, refresh_snapshot: bool) {
    let events = level.drain_events();
    let updated = level.drain_updated();
    tracing::trace!(events = events.len(), updated = updated.len(), "tick published");
    lock(&world.log).extend(events);

    let snapshot = if refresh_snapshot {
        match level.to_snapshot() {
            Ok(snapshot) => Some(snapshot),
            Err(error) => {
                tracing::warn!(%error, "snapshot failed");
                None
            }
        }
    } else {
        None
    };

    let mut view = lock(&world.view);
    view.state = level.state();
    view.tick = level.time().tick;
    view.tps = level.tps();
    view.stats = level.stats();
    if let Some(snapshot) = snapshot {
        view.snapshot = Some(snapshot);
        view.sequence = level.next_sequence();
    }
}

fn shutdown(level: &mut Level, world: &SharedWorld, save_path: Option<&PathBuf>) {
    if level.state() == LevelState::Running {
        if let Err(error) = level.begin_stop() {
            tracing::warn!(%error, "failed to stop level");
        }
    }
    if let Some(path) = save_path {
        if let Err(error) = level.save_to_file(path) {
            tracing::error!(path = %path.display(), %error, "failed to save level");
        }
    }
    if level.state() == LevelState::Stopping {
        if let Err(error) = level.finish_stop() {
            tracing::warn!(%error, "failed to stop level");
        }
    }
    publish(level, world, true);
    tracing::info!(level = %level.id(), "game loop stopped");
}
