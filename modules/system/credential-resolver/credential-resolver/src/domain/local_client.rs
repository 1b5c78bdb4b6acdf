//! Local (in-process) client for the credential resolver.

use std::sync::Arc;

use async_trait::async_trait;
use credential_resolver_sdk::{CredentialResolverClient, ResolveRequest, UserLookup};
use guard_security::{GateError, Principal, UserIdentity};

use super::Service;

/// Local client wrapping the service.
pub struct CredentialResolverLocalClient {
    svc: Arc<Service>,
}

impl CredentialResolverLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

/// Refusals are expected traffic; only collaborator failures are errors.
fn log_failure(op: &str, e: GateError) -> GateError {
    if e.as_auth().is_none() {
        tracing::error!(operation = op, error = %e, "credential_resolver call failed");
    }
    e
}

#[async_trait]
impl CredentialResolverClient for CredentialResolverLocalClient {
    async fn resolve(&self, request: &ResolveRequest<'_>) -> Result<Principal, GateError> {
        self.svc
            .resolve(request)
            .await
            .map_err(|e| log_failure("resolve", e))
    }

    async fn find_user(&self, lookup: &UserLookup) -> Result<Option<UserIdentity>, GateError> {
        self.svc
            .find_user(lookup)
            .await
            .map_err(|e| log_failure("find_user", e))
    }
}
