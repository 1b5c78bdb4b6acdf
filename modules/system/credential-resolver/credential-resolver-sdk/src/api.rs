//! Public API trait for the credential resolver.
//!
//! The gateway consumes this trait; the resolver implements it on top of a
//! [`crate::CredentialStore`].

use async_trait::async_trait;
use guard_security::{GateError, Principal, UserIdentity};

use crate::claim::CredentialClaim;
use crate::models::UserLookup;

/// Per-route switches that change how credentials resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RouteAuthSettings {
    /// Missing credentials resolve to an anonymous principal instead of failing.
    pub auth_optional: bool,
    pub allow_job_token: bool,
    pub allow_deploy_token: bool,
    /// Refuse outdated language-server clients on this route.
    pub restrict_language_server_clients: bool,
}

/// Request attributes some credentials are bound to.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientFacts<'a> {
    /// HTTP method, upper-case.
    pub method: &'a str,
    /// Absolute request URL without query or fragment.
    pub url: &'a str,
    /// Raw `DPoP` proof header.
    pub dpop_proof: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

/// Everything the resolver needs to turn a claim into a principal.
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub claim: &'a CredentialClaim,
    pub route: RouteAuthSettings,
    pub client: ClientFacts<'a>,
}

impl<'a> ResolveRequest<'a> {
    #[must_use]
    pub fn new(claim: &'a CredentialClaim) -> Self {
        Self {
            claim,
            route: RouteAuthSettings::default(),
            client: ClientFacts::default(),
        }
    }

    #[must_use]
    pub fn route(mut self, route: RouteAuthSettings) -> Self {
        self.route = route;
        self
    }

    #[must_use]
    pub fn client(mut self, client: ClientFacts<'a>) -> Self {
        self.client = client;
        self
    }
}

/// Public API trait for the credential resolver.
///
/// ```ignore
/// let principal = resolver.resolve(&ResolveRequest::new(&claim).route(settings)).await?;
/// ```
#[async_trait]
pub trait CredentialResolverClient: Send + Sync {
    /// Exchange a claim for a principal.
    ///
    /// # Errors
    ///
    /// - `GateError::Auth` with the refusal kind (`MissingToken`, `TokenNotFound`,
    ///   `TokenExpired`, `TokenRevoked`, `ImpersonationDisabled`,
    ///   `DpopValidationFailed`, `RestrictedClient`)
    /// - `GateError::Unavailable` / `GateError::Internal` if the store fails
    async fn resolve(&self, request: &ResolveRequest<'_>) -> Result<Principal, GateError>;

    /// Look up an active user, e.g. a sudo target.
    ///
    /// # Errors
    /// `GateError::Unavailable` / `GateError::Internal` if the store fails.
    async fn find_user(&self, lookup: &UserLookup) -> Result<Option<UserIdentity>, GateError>;
}
