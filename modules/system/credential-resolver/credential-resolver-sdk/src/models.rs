//! What a credential store knows about tokens and users.

use chrono::{DateTime, Utc};
use guard_security::UserIdentity;
use serde::{Deserialize, Serialize};

/// Flavor of a user access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTokenKind {
    #[default]
    Personal,
    /// Minted by an administrator to act as the owner.
    Impersonation,
    /// Issued to an OAuth application.
    #[serde(rename = "oauth")]
    OAuth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenRecord {
    pub id: u64,
    #[serde(default)]
    pub kind: AccessTokenKind,
    pub user_id: u64,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// `None` for tokens that were not created with granular permissions.
    #[serde(default)]
    pub granular_permissions: Option<Vec<String>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revoked: bool,
    /// RFC 7638 thumbprint of the key the token is bound to via `DPoP`.
    #[serde(default)]
    pub dpop_jkt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployTokenRecord {
    pub id: u64,
    pub project_id: u64,
    pub username: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revoked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTokenRecord {
    pub job_id: u64,
    pub project_id: u64,
    pub user_id: u64,
    /// Job tokens are only valid while their job runs.
    pub running: bool,
}

/// A token secret resolved by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoredCredential {
    AccessToken(AccessTokenRecord),
    DeployToken(DeployTokenRecord),
    JobToken(JobTokenRecord),
}

impl StoredCredential {
    /// Handle for the last-used bump. Job tokens are not tracked.
    #[must_use]
    pub fn token_ref(&self) -> Option<TokenRef> {
        match self {
            Self::AccessToken(token) => Some(TokenRef::AccessToken(token.id)),
            Self::DeployToken(token) => Some(TokenRef::DeployToken(token.id)),
            Self::JobToken(_) => None,
        }
    }
}

/// Identifies a stored token without carrying its secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenRef {
    AccessToken(u64),
    DeployToken(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub blocked: bool,
}

impl UserRecord {
    #[must_use]
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            is_admin: self.is_admin,
        }
    }
}

/// How to find a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Id(u64),
    Username(String),
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stored_credential_is_tagged_by_type() {
        let credential: StoredCredential = serde_json::from_value(json!({
            "type": "deploy_token",
            "id": 4,
            "project_id": 9,
            "username": "deployer",
            "scopes": ["read_registry"],
        }))
        .unwrap();

        assert_eq!(credential.token_ref(), Some(TokenRef::DeployToken(4)));
        let StoredCredential::DeployToken(token) = credential else {
            panic!("expected a deploy token");
        };
        assert!(!token.revoked);
        assert!(token.expires_at.is_none());
    }

    #[test]
    fn access_token_defaults() {
        let credential: StoredCredential = serde_json::from_value(json!({
            "type": "access_token",
            "id": 1,
            "user_id": 2,
            "kind": "oauth",
            "expires_at": "2030-01-01T00:00:00Z",
        }))
        .unwrap();

        let StoredCredential::AccessToken(token) = credential else {
            panic!("expected an access token");
        };
        assert_eq!(token.kind, AccessTokenKind::OAuth);
        assert!(token.scopes.is_empty());
        assert!(token.granular_permissions.is_none());
        assert!(token.expires_at.is_some());
    }

    #[test]
    fn job_tokens_are_not_tracked() {
        let credential = StoredCredential::JobToken(JobTokenRecord {
            job_id: 1,
            project_id: 2,
            user_id: 3,
            running: true,
        });
        assert_eq!(credential.token_ref(), None);
    }
}
