//! Credential resolution.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use credential_resolver_sdk::{
    AccessTokenKind, AccessTokenRecord, CredentialClaim, CredentialStore, DeployTokenRecord,
    JobTokenRecord, ResolveRequest, RouteAuthSettings, StoredCredential, TokenRef, UserLookup,
    UserRecord,
};
use guard_security::{
    AuthError, AuthMethod, DeployTokenPrincipal, GateError, JobTokenPrincipal, Principal,
    TokenScopes, UserIdentity, UserPrincipal,
};

use super::client_version::{InvalidVersion, LanguageServerPolicy};
use super::dpop::{DpopVerifier, ProofBinding};
use crate::config::ResolverConfig;

/// Basic-auth username CI jobs present together with their job token.
pub const CI_JOB_USERNAME: &str = "ci-job-token";

/// Credential resolver service.
pub struct Service {
    store: Arc<dyn CredentialStore>,
    cfg: ResolverConfig,
    dpop: DpopVerifier,
    language_server: LanguageServerPolicy,
}

impl Service {
    /// # Errors
    /// Returns [`InvalidVersion`] if the configured minimum language-server
    /// version does not parse.
    pub fn new(store: Arc<dyn CredentialStore>, cfg: ResolverConfig) -> Result<Self, InvalidVersion> {
        let language_server = LanguageServerPolicy::new(&cfg.language_server)?;
        let dpop = DpopVerifier::new(&cfg.dpop);
        Ok(Self {
            store,
            cfg,
            dpop,
            language_server,
        })
    }

    /// Exchange a claim for a principal.
    ///
    /// # Errors
    /// See [`credential_resolver_sdk::CredentialResolverClient::resolve`].
    pub async fn resolve(&self, req: &ResolveRequest<'_>) -> Result<Principal, GateError> {
        let Some(secret) = req.claim.secret() else {
            return anonymous_or_missing(req.route);
        };

        match req.claim {
            CredentialClaim::SessionCookie(_) => self.resolve_session(secret, req.route).await,
            CredentialClaim::BasicAuth { username, .. } => {
                self.resolve_token(secret, Some(username.as_str()), req).await
            }
            _ => self.resolve_token(secret, None, req).await,
        }
    }

    /// Active (not blocked) user matching the lookup.
    ///
    /// # Errors
    /// Store failures.
    pub async fn find_user(&self, lookup: &UserLookup) -> Result<Option<UserIdentity>, GateError> {
        let user = self.store.find_user(lookup).await?;
        Ok(user.filter(|u| !u.blocked).map(|u| u.identity()))
    }

    async fn resolve_session(
        &self,
        session_id: &str,
        route: RouteAuthSettings,
    ) -> Result<Principal, GateError> {
        let Some(user_id) = self.store.find_session(session_id).await? else {
            tracing::debug!("unknown session cookie, treating request as unauthenticated");
            return anonymous_or_missing(route);
        };
        let Some(user) = self.active_user(user_id).await? else {
            tracing::debug!(user_id, "session belongs to a missing or blocked user");
            return anonymous_or_missing(route);
        };

        Ok(Principal::User(UserPrincipal {
            identity: user.identity(),
            method: AuthMethod::Session,
            scopes: TokenScopes::unrestricted(),
        }))
    }

    async fn resolve_token(
        &self,
        secret: &str,
        basic_username: Option<&str>,
        req: &ResolveRequest<'_>,
    ) -> Result<Principal, GateError> {
        let credential = self
            .store
            .find_token(secret)
            .await?
            .ok_or(AuthError::TokenNotFound)?;
        let token_ref = credential.token_ref();

        let principal = match credential {
            StoredCredential::AccessToken(token) => {
                self.resolve_access_token(token, secret, basic_username, req)
                    .await?
            }
            StoredCredential::DeployToken(token) => {
                resolve_deploy_token(token, basic_username, req.route)?
            }
            StoredCredential::JobToken(job) => {
                self.resolve_job_token(&job, basic_username, req.route)
                    .await?
            }
        };

        tracing::trace!(principal = principal.kind(), "credential resolved");
        if let Some(token_ref) = token_ref {
            self.touch(token_ref);
        }
        Ok(principal)
    }

    async fn resolve_access_token(
        &self,
        token: AccessTokenRecord,
        secret: &str,
        basic_username: Option<&str>,
        req: &ResolveRequest<'_>,
    ) -> Result<Principal, GateError> {
        let user = self
            .active_user(token.user_id)
            .await?
            .ok_or(AuthError::TokenNotFound)?;
        if basic_username.is_some_and(|name| name != user.username) {
            return Err(AuthError::TokenNotFound.into());
        }

        let now = Utc::now();
        if token.expires_at.is_some_and(|at| at <= now) {
            return Err(AuthError::TokenExpired.into());
        }
        if token.revoked {
            return Err(AuthError::TokenRevoked.into());
        }
        if token.kind == AccessTokenKind::Impersonation && !self.cfg.impersonation_enabled {
            return Err(AuthError::ImpersonationDisabled.into());
        }
        if let Some(jkt) = token.dpop_jkt.as_deref() {
            let binding = ProofBinding {
                jkt,
                access_token: secret,
                method: req.client.method,
                url: req.client.url,
            };
            self.dpop
                .verify(req.client.dpop_proof, &binding, now)
                .map_err(|e| AuthError::DpopValidationFailed(e.to_string()))?;
        }
        if req.route.restrict_language_server_clients {
            self.language_server
                .check(req.client.user_agent)
                .map_err(AuthError::RestrictedClient)?;
        }

        let method = match token.kind {
            AccessTokenKind::Personal => AuthMethod::PersonalAccessToken { token_id: token.id },
            AccessTokenKind::Impersonation => AuthMethod::ImpersonationToken { token_id: token.id },
            AccessTokenKind::OAuth => AuthMethod::OAuth { token_id: token.id },
        };
        let scopes = TokenScopes::limited(token.scopes);
        let scopes = match token.granular_permissions {
            Some(permissions) => scopes.with_granular(permissions),
            None => scopes,
        };

        Ok(Principal::User(UserPrincipal {
            identity: user.identity(),
            method,
            scopes,
        }))
    }

    async fn resolve_job_token(
        &self,
        job: &JobTokenRecord,
        basic_username: Option<&str>,
        route: RouteAuthSettings,
    ) -> Result<Principal, GateError> {
        if !route.allow_job_token || !job.running {
            return Err(AuthError::TokenNotFound.into());
        }
        if basic_username.is_some_and(|name| name != CI_JOB_USERNAME) {
            return Err(AuthError::TokenNotFound.into());
        }
        if self.active_user(job.user_id).await?.is_none() {
            return Err(AuthError::TokenNotFound.into());
        }

        Ok(Principal::JobToken(JobTokenPrincipal {
            id: job.job_id,
            project_id: job.project_id,
            user_id: job.user_id,
        }))
    }

    async fn active_user(&self, id: u64) -> Result<Option<UserRecord>, GateError> {
        let user = self.store.find_user(&UserLookup::Id(id)).await?;
        Ok(user.filter(|u| !u.blocked))
    }

    /// Best-effort last-used bump, detached from the request.
    fn touch(&self, token: TokenRef) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(?token, "no runtime, skipping last-used update");
            return;
        };
        let store = Arc::clone(&self.store);
        let timeout = Duration::from_millis(self.cfg.touch_timeout_ms);
        handle.spawn(async move {
            match tokio::time::timeout(timeout, store.touch_last_used(token)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::debug!(?token, error = %e, "last-used update failed"),
                Err(_) => tracing::debug!(?token, "last-used update timed out"),
            }
        });
    }
}

fn resolve_deploy_token(
    token: DeployTokenRecord,
    basic_username: Option<&str>,
    route: RouteAuthSettings,
) -> Result<Principal, GateError> {
    if !route.allow_deploy_token {
        return Err(AuthError::TokenNotFound.into());
    }
    if basic_username.is_some_and(|name| name != token.username) {
        return Err(AuthError::TokenNotFound.into());
    }
    if token.expires_at.is_some_and(|at| at <= Utc::now()) {
        return Err(AuthError::TokenExpired.into());
    }
    if token.revoked {
        return Err(AuthError::TokenRevoked.into());
    }

    Ok(Principal::DeployToken(DeployTokenPrincipal {
        id: token.id,
        project_id: token.project_id,
        username: token.username,
        permissions: TokenScopes::limited(token.scopes),
    }))
}

fn anonymous_or_missing(route: RouteAuthSettings) -> Result<Principal, GateError> {
    if route.auth_optional {
        Ok(Principal::Anonymous)
    } else {
        Err(AuthError::MissingToken.into())
    }
}
