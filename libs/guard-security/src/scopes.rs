//! Token scope grants.
//!
//! A scope is a coarse permission carried by a token (`api`, `read_user`, ...).
//! Tokens may additionally carry *granular permissions*, fine-grained
//! capabilities that narrow what a coarse scope allows.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Well-known scope names.
pub mod scope {
    pub const API: &str = "api";
    pub const READ_API: &str = "read_api";
    pub const READ_USER: &str = "read_user";
    pub const READ_REPOSITORY: &str = "read_repository";
    pub const WRITE_REPOSITORY: &str = "write_repository";
    pub const READ_REGISTRY: &str = "read_registry";
    pub const WRITE_REGISTRY: &str = "write_registry";
    pub const READ_PACKAGE_REGISTRY: &str = "read_package_registry";
    pub const WRITE_PACKAGE_REGISTRY: &str = "write_package_registry";
    pub const AI_FEATURES: &str = "ai_features";
    pub const SUDO: &str = "sudo";
}

/// Scopes granted to the credential a principal authenticated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScopes {
    /// No token restrictions: session logins and CI job tokens.
    Unrestricted,
    /// An explicit list of scopes, optionally narrowed by granular permissions.
    Limited {
        scopes: BTreeSet<String>,
        /// `None` for tokens that predate granular permissions; such tokens are
        /// only subject to coarse scope checks.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        granular: Option<BTreeSet<String>>,
    },
}

impl TokenScopes {
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::Unrestricted
    }

    #[must_use]
    pub fn limited<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Limited {
            scopes: scopes.into_iter().map(Into::into).collect(),
            granular: None,
        }
    }

    /// Attach granular permissions. Has no effect on unrestricted grants.
    #[must_use]
    pub fn with_granular<I, S>(self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self {
            Self::Unrestricted => Self::Unrestricted,
            Self::Limited { scopes, .. } => Self::Limited {
                scopes,
                granular: Some(permissions.into_iter().map(Into::into).collect()),
            },
        }
    }

    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }

    /// Whether `scope` was granted explicitly or through an unrestricted grant.
    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Limited { scopes, .. } => scopes.contains(scope),
        }
    }

    /// Whether the grant intersects `required`. An empty requirement is always met.
    #[must_use]
    pub fn allows_any<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required.is_empty() || required.iter().any(|s| self.contains(s.as_ref()))
    }

    /// Whether the grant carries the granular `permission`.
    ///
    /// Unrestricted grants and tokens without granular permissions pass.
    #[must_use]
    pub fn permits(&self, permission: &str) -> bool {
        match self {
            Self::Limited {
                granular: Some(granular),
                ..
            } => granular.contains(permission),
            _ => true,
        }
    }

    /// Explicitly granted scopes; empty for unrestricted grants.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let scopes = match self {
            Self::Unrestricted => None,
            Self::Limited { scopes, .. } => Some(scopes),
        };
        scopes.into_iter().flatten().map(String::as_str)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn unrestricted_allows_everything() {
        let scopes = TokenScopes::unrestricted();
        assert!(scopes.allows_any(&[scope::API]));
        assert!(scopes.allows_any(&[scope::SUDO, scope::READ_USER]));
        assert!(scopes.permits("read_issue"));
        assert_eq!(scopes.iter().count(), 0);
    }

    #[test]
    fn limited_requires_intersection() {
        let scopes = TokenScopes::limited([scope::READ_USER]);
        assert!(scopes.allows_any(&[scope::API, scope::READ_USER]));
        assert!(!scopes.allows_any(&[scope::API, scope::READ_API]));
    }

    #[test]
    fn empty_requirement_is_met_by_empty_grant() {
        let scopes = TokenScopes::limited(Vec::<String>::new());
        assert!(scopes.allows_any::<&str>(&[]));
    }

    #[test]
    fn widening_never_revokes_access() {
        let required = [scope::API, scope::READ_API];
        let mut granted: Vec<&str> = Vec::new();
        let mut previously_allowed = false;

        for next in [scope::READ_USER, scope::SUDO, scope::READ_API, scope::API] {
            granted.push(next);
            let allowed = TokenScopes::limited(granted.clone()).allows_any(&required);
            assert!(allowed || !previously_allowed, "widening {granted:?} lost access");
            previously_allowed = allowed;
        }
        assert!(previously_allowed);
    }

    #[test]
    fn granular_permissions_narrow_only_granular_tokens() {
        let legacy = TokenScopes::limited([scope::API]);
        assert!(legacy.permits("read_issue"));

        let granular = TokenScopes::limited([scope::API]).with_granular(["read_merge_request"]);
        assert!(granular.allows_any(&[scope::API]));
        assert!(!granular.permits("read_issue"));
        assert!(granular.permits("read_merge_request"));
    }

    #[test]
    fn granular_is_ignored_for_unrestricted() {
        let scopes = TokenScopes::unrestricted().with_granular(["read_issue"]);
        assert!(scopes.is_unrestricted());
    }

    #[test]
    fn serializes_with_variant_tag() {
        let value = serde_json::to_value(TokenScopes::limited([scope::API])).unwrap();
        assert_eq!(value, serde_json::json!({ "limited": { "scopes": ["api"] } }));
    }
}
