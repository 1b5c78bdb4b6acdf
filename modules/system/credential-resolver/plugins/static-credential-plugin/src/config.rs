//! Configuration for the static credential plugin.

use credential_resolver_sdk::{StoredCredential, UserRecord};
use serde::Deserialize;

/// Plugin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticCredentialPluginConfig {
    pub users: Vec<UserRecord>,

    /// Token secret to credential mappings.
    pub tokens: Vec<TokenMapping>,

    pub sessions: Vec<SessionMapping>,
}

/// Maps a token secret to the credential it represents.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenMapping {
    pub token: String,
    pub credential: StoredCredential,
}

/// Maps a session cookie value to a user.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionMapping {
    pub session_id: String,
    pub user_id: u64,
}
