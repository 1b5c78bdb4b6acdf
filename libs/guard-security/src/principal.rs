//! Resolved identities.

use serde::{Deserialize, Serialize};

use crate::scopes::TokenScopes;

static UNRESTRICTED: TokenScopes = TokenScopes::Unrestricted;

/// Account attributes of a user, as known to the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

/// How a user principal proved its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthMethod {
    Session,
    PersonalAccessToken { token_id: u64 },
    /// Token an administrator minted to act as this user.
    ImpersonationToken { token_id: u64 },
    OAuth { token_id: u64 },
}

impl AuthMethod {
    /// Whether the principal presented an access token (personal, impersonation or OAuth).
    #[must_use]
    pub fn is_access_token(self) -> bool {
        !matches!(self, Self::Session)
    }

    #[must_use]
    pub fn token_id(self) -> Option<u64> {
        match self {
            Self::Session => None,
            Self::PersonalAccessToken { token_id }
            | Self::ImpersonationToken { token_id }
            | Self::OAuth { token_id } => Some(token_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPrincipal {
    pub identity: UserIdentity,
    pub method: AuthMethod,
    pub scopes: TokenScopes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployTokenPrincipal {
    pub id: u64,
    pub project_id: u64,
    pub username: String,
    pub permissions: TokenScopes,
}

/// A CI job acting on behalf of the user who triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTokenPrincipal {
    /// Job id.
    pub id: u64,
    pub project_id: u64,
    pub user_id: u64,
}

/// Identity attached to a request after credential resolution.
///
/// Created per request and dropped with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    User(UserPrincipal),
    DeployToken(DeployTokenPrincipal),
    JobToken(JobTokenPrincipal),
    Anonymous,
}

impl Principal {
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Only users can be administrators; tokens bound to projects never are.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::User(user) if user.identity.is_admin)
    }

    /// The user this principal acts for, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<u64> {
        match self {
            Self::User(user) => Some(user.identity.id),
            Self::JobToken(job) => Some(job.user_id),
            Self::DeployToken(_) | Self::Anonymous => None,
        }
    }

    #[must_use]
    pub fn as_user(&self) -> Option<&UserPrincipal> {
        match self {
            Self::User(user) => Some(user),
            _ => None,
        }
    }

    /// Scopes to check endpoint requirements against. `None` for anonymous callers.
    #[must_use]
    pub fn token_scopes(&self) -> Option<&TokenScopes> {
        match self {
            Self::User(user) => Some(&user.scopes),
            Self::DeployToken(token) => Some(&token.permissions),
            Self::JobToken(_) => Some(&UNRESTRICTED),
            Self::Anonymous => None,
        }
    }

    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::DeployToken(_) => "deploy_token",
            Self::JobToken(_) => "job_token",
            Self::Anonymous => "anonymous",
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::scopes::scope;

    fn user(is_admin: bool) -> Principal {
        Principal::User(UserPrincipal {
            identity: UserIdentity {
                id: 7,
                username: "alice".to_owned(),
                email: "alice@example.com".to_owned(),
                is_admin,
            },
            method: AuthMethod::PersonalAccessToken { token_id: 1 },
            scopes: TokenScopes::limited([scope::API]),
        })
    }

    #[test]
    fn admin_flag_only_applies_to_users() {
        assert!(user(true).is_admin());
        assert!(!user(false).is_admin());

        let job = Principal::JobToken(JobTokenPrincipal {
            id: 1,
            project_id: 2,
            user_id: 7,
        });
        assert!(!job.is_admin());
        assert_eq!(job.user_id(), Some(7));
        assert!(job.token_scopes().is_some_and(TokenScopes::is_unrestricted));
    }

    #[test]
    fn deploy_tokens_expose_permissions_as_scopes() {
        let token = Principal::DeployToken(DeployTokenPrincipal {
            id: 3,
            project_id: 4,
            username: "deployer".to_owned(),
            permissions: TokenScopes::limited([scope::READ_REGISTRY]),
        });
        assert_eq!(token.user_id(), None);
        assert!(
            token
                .token_scopes()
                .is_some_and(|s| s.contains(scope::READ_REGISTRY))
        );
    }

    #[test]
    fn anonymous_has_no_scopes() {
        assert!(Principal::Anonymous.token_scopes().is_none());
        assert_eq!(Principal::Anonymous.kind(), "anonymous");
    }

    #[test]
    fn session_is_not_an_access_token() {
        assert!(!AuthMethod::Session.is_access_token());
        assert!(AuthMethod::OAuth { token_id: 2 }.is_access_token());
        assert_eq!(AuthMethod::OAuth { token_id: 2 }.token_id(), Some(2));
    }
}
