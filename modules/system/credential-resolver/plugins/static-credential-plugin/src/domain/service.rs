//! In-memory credential lookups.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use credential_resolver_sdk::{StoredCredential, TokenRef, UserLookup, UserRecord};
use dashmap::DashMap;

use crate::config::StaticCredentialPluginConfig;

/// Credential store backed by configuration.
///
/// Lookups are immutable after construction; only last-used timestamps change.
pub struct StaticCredentialStore {
    users: HashMap<u64, UserRecord>,
    /// Lower-cased username to user id.
    usernames: HashMap<String, u64>,
    tokens: HashMap<String, StoredCredential>,
    sessions: HashMap<String, u64>,
    last_used: DashMap<TokenRef, DateTime<Utc>>,
}

impl StaticCredentialStore {
    /// Build the store from plugin configuration.
    ///
    /// Later entries win when a user id, token or session id is repeated.
    #[must_use]
    pub fn from_config(cfg: &StaticCredentialPluginConfig) -> Self {
        let users: HashMap<u64, UserRecord> =
            cfg.users.iter().map(|u| (u.id, u.clone())).collect();
        let usernames = users
            .values()
            .map(|u| (u.username.to_lowercase(), u.id))
            .collect();
        let tokens = cfg
            .tokens
            .iter()
            .map(|m| (m.token.clone(), m.credential.clone()))
            .collect();
        let sessions = cfg
            .sessions
            .iter()
            .map(|m| (m.session_id.clone(), m.user_id))
            .collect();

        tracing::debug!(
            users = cfg.users.len(),
            tokens = cfg.tokens.len(),
            sessions = cfg.sessions.len(),
            "static credential store loaded"
        );

        Self {
            users,
            usernames,
            tokens,
            sessions,
            last_used: DashMap::new(),
        }
    }

    pub(crate) fn token(&self, secret: &str) -> Option<StoredCredential> {
        self.tokens.get(secret).cloned()
    }

    /// Usernames match case-insensitively.
    pub(crate) fn user(&self, lookup: &UserLookup) -> Option<UserRecord> {
        let id = match lookup {
            UserLookup::Id(id) => *id,
            UserLookup::Username(name) => *self.usernames.get(&name.to_lowercase())?,
        };
        self.users.get(&id).cloned()
    }

    pub(crate) fn session(&self, session_id: &str) -> Option<u64> {
        self.sessions.get(session_id).copied()
    }

    pub(crate) fn touch(&self, token: TokenRef) {
        self.last_used.insert(token, Utc::now());
    }

    /// When the token was last seen, if ever.
    #[must_use]
    pub fn last_used(&self, token: TokenRef) -> Option<DateTime<Utc>> {
        self.last_used.get(&token).map(|entry| *entry.value())
    }
}
