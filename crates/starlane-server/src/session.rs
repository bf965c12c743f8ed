//! Connected sessions: admission, flood control and departure.
//!
//! The registry only decides who may hold a session. Player entities live in
//! the level and outlive their sessions, so a returning account resumes its
//! existing player.

use std::collections::HashMap;

use serde::Serialize;

use starlane_core::constants::PACKET_FLOOD_LIMIT;
use starlane_core::types::EntityId;

use crate::config::AccessLists;
use crate::error::AdmissionError;

/// An authenticated external account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub disabled: bool,
}

/// Turns a client token into an account.
pub trait Authenticator: Send + Sync {
    fn verify(&self, token: &str, username: &str) -> Result<Account, AdmissionError>;
}

/// Accepts any well-formed token and uses it as the account id.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAuthenticator;

const MAX_TOKEN_LEN: usize = 64;

impl Authenticator for LocalAuthenticator {
    fn verify(&self, token: &str, username: &str) -> Result<Account, AdmissionError> {
        let well_formed = !token.is_empty()
            && token.len() <= MAX_TOKEN_LEN
            && token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !well_formed {
            return Err(AdmissionError::InvalidToken);
        }
        let username = if username.trim().is_empty() {
            token
        } else {
            username.trim()
        };
        Ok(Account {
            id: token.to_string(),
            username: username.to_string(),
            disabled: false,
        })
    }
}

/// Admission policy switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    pub max_clients: usize,
    pub whitelist: bool,
    pub blacklist: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub session: String,
    pub account: String,
    pub player: EntityId,
}

#[derive(Debug, Clone)]
struct Session {
    account: String,
    player: EntityId,
    /// Second in which `packets` were counted.
    window: u64,
    packets: u32,
}

#[derive(Debug)]
pub struct SessionRegistry {
    policy: AdmissionPolicy,
    sessions: HashMap<String, Session>,
    next_session: u64,
    stopping: bool,
}

impl SessionRegistry {
    pub fn new(policy: AdmissionPolicy) -> Self {
        Self {
            policy,
            sessions: HashMap::new(),
            next_session: 1,
            stopping: false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn max_clients(&self) -> usize {
        self.policy.max_clients
    }

    pub fn set_stopping(&mut self, stopping: bool) {
        self.stopping = stopping;
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    /// Admit an account, checking the rejection reasons in a fixed order.
    pub fn admit(
        &mut self,
        account: &Account,
        lists: &AccessLists,
    ) -> Result<SessionInfo, AdmissionError> {
        if self.stopping {
            return Err(AdmissionError::Stopping);
        }
        if account.disabled {
            return Err(AdmissionError::Disabled);
        }
        if self.policy.whitelist && !lists.whitelist.contains(&account.id) {
            return Err(AdmissionError::NotWhitelisted);
        }
        if self.policy.blacklist && lists.blacklist.contains(&account.id) {
            return Err(AdmissionError::Banned);
        }
        if self.sessions.values().any(|s| s.account == account.id) {
            return Err(AdmissionError::AlreadyConnected);
        }
        if self.sessions.len() >= self.policy.max_clients && !lists.is_op(&account.id) {
            return Err(AdmissionError::Full);
        }

        let session = format!("session-{}", self.next_session);
        self.next_session += 1;
        let player = EntityId::new(account.id.clone());
        self.sessions.insert(
            session.clone(),
            Session {
                account: account.id.clone(),
                player: player.clone(),
                window: 0,
                packets: 0,
            },
        );
        tracing::info!(%session, account = %account.id, username = %account.username, "session admitted");
        Ok(SessionInfo {
            session,
            account: account.id.clone(),
            player,
        })
    }

    /// End a session. Returns the account's player if the session existed.
    pub fn leave(&mut self, session: &str) -> Option<EntityId> {
        let removed = self.sessions.remove(session)?;
        tracing::info!(%session, account = %removed.account, "session closed");
        Some(removed.player)
    }

    /// Count one inbound command during `second`. A session that exceeds the
    /// per-second limit is dropped.
    pub fn record_packet(&mut self, session: &str, second: u64) -> Result<EntityId, AdmissionError> {
        let Some(entry) = self.sessions.get_mut(session) else {
            return Err(AdmissionError::InvalidToken);
        };
        if entry.window != second {
            entry.window = second;
            entry.packets = 0;
        }
        entry.packets += 1;
        if entry.packets > PACKET_FLOOD_LIMIT {
            tracing::warn!(%session, account = %entry.account, "session kicked for flooding");
            self.sessions.remove(session);
            return Err(AdmissionError::Flooding);
        }
        Ok(entry.player.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_clients: usize) -> AdmissionPolicy {
        AdmissionPolicy {
            max_clients,
            whitelist: false,
            blacklist: true,
        }
    }

    fn account(id: &str) -> Account {
        Account {
            id: id.to_string(),
            username: id.to_string(),
            disabled: false,
        }
    }

    #[test]
    fn test_local_authenticator() {
        let auth = LocalAuthenticator;
        let ok = auth.verify("pilot_7", "").unwrap();
        assert_eq!(ok.id, "pilot_7");
        assert_eq!(ok.username, "pilot_7");
        assert_eq!(auth.verify("", "x"), Err(AdmissionError::InvalidToken));
        assert_eq!(auth.verify("bad token", "x"), Err(AdmissionError::InvalidToken));
    }

    #[test]
    fn test_admit_and_leave() {
        let mut registry = SessionRegistry::new(policy(2));
        let lists = AccessLists::default();
        let info = registry.admit(&account("a"), &lists).unwrap();
        assert_eq!(info.player, EntityId::new("a"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.leave(&info.session), Some(EntityId::new("a")));
        assert!(registry.is_empty());
        assert_eq!(registry.leave(&info.session), None);
    }

    #[test]
    fn test_rejection_reasons() {
        let mut lists = AccessLists::default();
        lists.blacklist.insert("banned".into());

        let mut registry = SessionRegistry::new(policy(1));
        assert_eq!(
            registry.admit(&account("banned"), &lists),
            Err(AdmissionError::Banned)
        );

        let mut disabled = account("d");
        disabled.disabled = true;
        assert_eq!(registry.admit(&disabled, &lists), Err(AdmissionError::Disabled));

        registry.admit(&account("a"), &lists).unwrap();
        assert_eq!(
            registry.admit(&account("a"), &lists),
            Err(AdmissionError::AlreadyConnected)
        );
        assert_eq!(registry.admit(&account("b"), &lists), Err(AdmissionError::Full));

        registry.set_stopping(true);
        assert_eq!(registry.admit(&account("c"), &lists), Err(AdmissionError::Stopping));
    }

    #[test]
    fn test_whitelist_and_operator_bypass() {
        let mut lists = AccessLists::default();
        lists.whitelist.insert("a".into());
        lists.whitelist.insert("op".into());
        lists.ops.insert("op".into());
        let mut registry = SessionRegistry::new(AdmissionPolicy {
            max_clients: 1,
            whitelist: true,
            blacklist: false,
        });

        assert_eq!(
            registry.admit(&account("stranger"), &lists),
            Err(AdmissionError::NotWhitelisted)
        );
        registry.admit(&account("a"), &lists).unwrap();
        assert!(registry.admit(&account("op"), &lists).is_ok(), "operators skip the client cap");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_flood_limit_kicks_session() {
        let mut registry = SessionRegistry::new(policy(4));
        let info = registry.admit(&account("a"), &AccessLists::default()).unwrap();

        for _ in 0..PACKET_FLOOD_LIMIT {
            assert!(registry.record_packet(&info.session, 3).is_ok());
        }
        // A new second resets the window.
        assert!(registry.record_packet(&info.session, 4).is_ok());
        for _ in 1..PACKET_FLOOD_LIMIT {
            registry.record_packet(&info.session, 4).unwrap();
        }
        assert_eq!(
            registry.record_packet(&info.session, 4),
            Err(AdmissionError::Flooding)
        );
        assert!(registry.is_empty(), "flooding session must be dropped");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(AdmissionError::Full.to_string(), "Server full");
        assert_eq!(AdmissionError::Flooding.to_string(), "Sending to many packets");
        assert_eq!(
            AdmissionError::Stopping.to_string(),
            "Server is stopping or restarting"
        );
    }
}
