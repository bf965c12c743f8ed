//! Server errors.

use starlane_core::SimError;

/// Why a connection was refused or dropped. The messages are shown to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("Server is stopping or restarting")]
    Stopping,

    #[error("Auth request failed")]
    AuthRequestFailed,

    #[error("Invalid token")]
    InvalidToken,

    #[error("You are not whitelisted")]
    NotWhitelisted,

    #[error("You are banned from this server")]
    Banned,

    #[error("Your account is disabled")]
    Disabled,

    #[error("Server full")]
    Full,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Sending to many packets")]
    Flooding,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
