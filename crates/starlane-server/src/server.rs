//! Process bootstrap: tracing, level setup, game loop and HTTP server.

use std::io::{self, Result};
use std::net::SocketAddr;
use std::sync::Arc;

use starlane_sim::{Level, LevelConfig};

use crate::config::{AccessLists, ServerConfig};
use crate::error::ServerError;
use crate::game_loop::spawn_game_loop;
use crate::http::router;
use crate::session::LocalAuthenticator;
use crate::state::{AppState, SharedWorld};

pub fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Load the saved level if one exists, otherwise generate a new one.
pub fn build_level(config: &ServerConfig) -> std::result::Result<Level, ServerError> {
    if let Some(path) = &config.save_path {
        if path.exists() {
            return Ok(Level::load_from_file(path)?);
        }
        tracing::info!(path = %path.display(), "no saved level, generating");
    }
    Ok(Level::generate(LevelConfig {
        seed: config.seed,
        ..LevelConfig::default()
    })?)
}

/// Serve `config` on an already bound listener until ctrl-c.
pub async fn run(listener: tokio::net::TcpListener, config: ServerConfig) -> Result<()> {
    let address = listener.local_addr()?;
    let access = AccessLists::load(&config.data_dir).map_err(io::Error::other)?;

    let mut level = build_level(&config).map_err(io::Error::other)?;
    level.start().map_err(io::Error::other)?;
    let world = Arc::new(SharedWorld::new(&mut level).map_err(io::Error::other)?);
    let (command_tx, game_loop) = spawn_game_loop(level, world.clone(), config.save_path.clone())?;

    let state = Arc::new(AppState::new(
        config,
        access,
        Arc::new(LocalAuthenticator),
        command_tx,
        world,
    ));
    let app = router(state.clone());

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        });

    state.begin_shutdown();
    match tokio::task::spawn_blocking(move || game_loop.join()).await {
        Ok(Ok(())) => {}
        _ => tracing::error!("game loop thread panicked"),
    }
    served
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();
    let config = ServerConfig::from_env();

    let address = SocketAddr::from(([0, 0, 0, 0], config.port));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener, config).await
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_level_is_seeded() {
        let config = ServerConfig {
            seed: 7,
            ..ServerConfig::default()
        };
        let a = build_level(&config).unwrap();
        let b = build_level(&config).unwrap();
        assert_eq!(a.name(), b.name());
        assert_eq!(a.entity_ids(), b.entity_ids());
    }

    #[test]
    fn test_build_level_prefers_save_file() {
        let path = std::env::temp_dir().join(format!("starlane-boot-{}.json", std::process::id()));
        let original = Level::generate(LevelConfig {
            seed: 99,
            ..LevelConfig::default()
        })
        .unwrap();
        original.save_to_file(&path).unwrap();

        let config = ServerConfig {
            save_path: Some(path.clone()),
            ..ServerConfig::default()
        };
        let loaded = build_level(&config).unwrap();
        assert_eq!(loaded.id(), original.id());
        std::fs::remove_file(&path).unwrap();
    }
}
