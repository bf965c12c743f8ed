//! HTTP surface: status, resync, sessions and actions.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use starlane_core::actions::{Action, ActionOutcome, ActionRequest};
use starlane_core::events::SequencedEvent;
use starlane_core::snapshot::LevelSnapshot;
use starlane_core::version::CURRENT_VERSION;

use crate::error::AdmissionError;
use crate::state::{lock, AppState, GameLoopCommand};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Public health/status projection.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PingInfo {
    pub current_clients: usize,
    pub max_clients: usize,
    pub message: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    /// Sequence number of the first event not reflected in `level`.
    pub sequence: u64,
    pub level: LevelSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub since: u64,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<SequencedEvent>,
    /// Pass as `since` on the next poll.
    pub next: u64,
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub token: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ActionBody {
    pub session: String,
    pub action: Action,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub ticket: u64,
    pub ok: bool,
    pub outcome: ActionOutcome,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/snapshot", get(snapshot_handler))
        .route("/events", get(events_handler))
        .route("/sessions", post(join_handler))
        .route("/sessions/{id}", delete(leave_handler))
        .route("/actions", post(action_handler))
        .with_state(state)
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn admission_status(error: AdmissionError) -> StatusCode {
    match error {
        AdmissionError::Stopping | AdmissionError::Full => StatusCode::SERVICE_UNAVAILABLE,
        AdmissionError::AuthRequestFailed => StatusCode::BAD_GATEWAY,
        AdmissionError::InvalidToken => StatusCode::UNAUTHORIZED,
        AdmissionError::NotWhitelisted | AdmissionError::Banned | AdmissionError::Disabled => {
            StatusCode::FORBIDDEN
        }
        AdmissionError::AlreadyConnected => StatusCode::CONFLICT,
        AdmissionError::Flooding => StatusCode::TOO_MANY_REQUESTS,
    }
}

fn rejected(error: AdmissionError) -> Response {
    error_response(admission_status(error), error)
}

pub async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (current_clients, max_clients) = {
        let sessions = lock(&state.sessions);
        (sessions.len(), sessions.max_clients())
    };
    Json(PingInfo {
        current_clients,
        max_clients,
        message: state.config.message.clone(),
        version: CURRENT_VERSION.to_string(),
        uptime: state.config.public_uptime.then(|| state.uptime_secs()),
    })
}

pub async fn snapshot_handler(State(state): State<Arc<AppState>>) -> Response {
    let view = lock(&state.world.view);
    match &view.snapshot {
        Some(level) => Json(SnapshotResponse {
            sequence: view.sequence,
            level: level.clone(),
        })
        .into_response(),
        None => error_response(StatusCode::SERVICE_UNAVAILABLE, "no snapshot yet"),
    }
}

pub async fn events_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Response {
    let log = lock(&state.world.log);
    match log.since(query.since) {
        Ok(events) => {
            let next = events.last().map_or(query.since, |e| e.seq + 1);
            Json(EventsResponse { events, next }).into_response()
        }
        Err(expired) => error_response(StatusCode::CONFLICT, expired),
    }
}

pub async fn join_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<JoinRequest>,
) -> Response {
    let account = match state.authenticator.verify(&payload.token, &payload.name) {
        Ok(account) => account,
        Err(error) => {
            tracing::debug!(%error, "authentication failed");
            return rejected(error);
        }
    };

    let admitted = {
        let access = lock(&state.access);
        lock(&state.sessions).admit(&account, &access)
    };
    let info = match admitted {
        Ok(info) => info,
        Err(error) => {
            tracing::info!(account = %account.id, %error, "session rejected");
            return rejected(error);
        }
    };

    let command = GameLoopCommand::Join {
        player: info.player.clone(),
        name: account.username.clone(),
    };
    if !state.send(command) {
        lock(&state.sessions).leave(&info.session);
        return rejected(AdmissionError::Stopping);
    }
    (StatusCode::CREATED, Json(info)).into_response()
}

pub async fn leave_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match lock(&state.sessions).leave(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => error_response(StatusCode::NOT_FOUND, "unknown session"),
    }
}

pub async fn action_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ActionBody>,
) -> Response {
    let second = state.uptime_secs();
    let recorded = lock(&state.sessions).record_packet(&payload.session, second);
    let issuer = match recorded {
        Ok(player) => player,
        Err(error) => return rejected(error),
    };

    let (reply_tx, reply_rx) = oneshot::channel();
    let command = GameLoopCommand::Action {
        request: ActionRequest {
            issuer,
            action: payload.action,
        },
        reply: Some(reply_tx),
    };
    if !state.send(command) {
        return rejected(AdmissionError::Stopping);
    }

    match reply_rx.await {
        Ok(receipt) => Json(ActionResponse {
            ticket: receipt.ticket,
            ok: receipt.outcome.succeeded(),
            outcome: receipt.outcome,
        })
        .into_response(),
        // The loop shut down before the next tick.
        Err(_) => rejected(AdmissionError::Stopping),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    use starlane_sim::{Level, LevelConfig};

    use crate::config::{AccessLists, ServerConfig};
    use crate::game_loop::spawn_game_loop;
    use crate::session::LocalAuthenticator;
    use crate::state::SharedWorld;

    /// App state whose loop is a bare channel; the receiver must stay alive.
    fn detached_state(config: ServerConfig) -> (Arc<AppState>, mpsc::Receiver<GameLoopCommand>) {
        let mut level = Level::generate(LevelConfig::default()).unwrap();
        let world = Arc::new(SharedWorld::new(&mut level).unwrap());
        let (tx, rx) = mpsc::channel();
        let state = AppState::new(
            config,
            AccessLists::default(),
            Arc::new(LocalAuthenticator),
            tx,
            world,
        );
        (Arc::new(state), rx)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn join_request(token: &str) -> Json<JoinRequest> {
        Json(JoinRequest {
            token: token.to_string(),
            name: "Pilot".to_string(),
        })
    }

    #[tokio::test]
    async fn test_status_reports_sessions() {
        let config = ServerConfig {
            message: "hello".into(),
            public_uptime: true,
            ..ServerConfig::default()
        };
        let (state, _rx) = detached_state(config);
        let response = join_handler(State(state.clone()), join_request("alice")).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = status_handler(State(state)).await.into_response();
        let info: PingInfo = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(info.current_clients, 1);
        assert_eq!(info.max_clients, 10);
        assert_eq!(info.message, "hello");
        assert_eq!(info.version, CURRENT_VERSION);
        assert!(info.uptime.is_some());
    }

    #[tokio::test]
    async fn test_status_hides_uptime_by_default() {
        let (state, _rx) = detached_state(ServerConfig::default());
        let response = status_handler(State(state)).await.into_response();
        let body = body_json(response).await;
        assert!(body.get("uptime").is_none());
    }

    #[tokio::test]
    async fn test_join_rejections_carry_reason() {
        let (state, rx) = detached_state(ServerConfig::default());
        let first = join_handler(State(state.clone()), join_request("alice")).await;
        assert_eq!(first.status(), StatusCode::CREATED);
        assert!(matches!(rx.try_recv(), Ok(GameLoopCommand::Join { .. })));

        let again = join_handler(State(state.clone()), join_request("alice")).await;
        assert_eq!(again.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(again).await["error"], "Already connected");

        let bad = join_handler(State(state), join_request("not a token")).await;
        assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(bad).await["error"], "Invalid token");
    }

    #[tokio::test]
    async fn test_leave_unknown_session() {
        let (state, _rx) = detached_state(ServerConfig::default());
        let response = leave_handler(State(state.clone()), Path("nope".into())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let joined = join_handler(State(state.clone()), join_request("bob")).await;
        let session = body_json(joined).await["session"].as_str().unwrap().to_string();
        let response = leave_handler(State(state), Path(session)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_snapshot_and_expired_events() {
        let (state, _rx) = detached_state(ServerConfig::default());
        let response = snapshot_handler(State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let sequence = body["sequence"].as_u64().unwrap();
        assert_eq!(body["level"]["version"], CURRENT_VERSION);

        let current = events_handler(State(state.clone()), Query(EventsQuery { since: sequence })).await;
        let body = body_json(current).await;
        assert_eq!(body["next"].as_u64(), Some(sequence));

        let stale = events_handler(State(state), Query(EventsQuery { since: 0 })).await;
        assert_eq!(stale.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_action_round_trip_through_loop() {
        let mut level = Level::generate(LevelConfig::default()).unwrap();
        level.start().unwrap();
        let world = Arc::new(SharedWorld::new(&mut level).unwrap());
        let (tx, handle) = spawn_game_loop(level, world.clone(), None).unwrap();
        let state = Arc::new(AppState::new(
            ServerConfig::default(),
            AccessLists::default(),
            Arc::new(LocalAuthenticator),
            tx,
            world,
        ));

        let joined = join_handler(State(state.clone()), join_request("carol")).await;
        let session = body_json(joined).await["session"].as_str().unwrap().to_string();

        let response = action_handler(
            State(state.clone()),
            Json(ActionBody {
                session,
                action: Action::Move(Vec::new()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["ok"], true);

        let unknown = action_handler(
            State(state.clone()),
            Json(ActionBody {
                session: "session-999".into(),
                action: Action::Move(Vec::new()),
            }),
        )
        .await;
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);

        state.begin_shutdown();
        tokio::task::spawn_blocking(move || handle.join().unwrap())
            .await
            .unwrap();
    }
}
