//! Collaborator trait implementations for the static capabilities.

use async_trait::async_trait;
use capability_resolver_sdk::{AccessDirectory, FeatureFlags};
use guard_security::{AccessLevel, GateError, Principal, ResourceRef};

use super::service::StaticCapabilities;

#[async_trait]
impl FeatureFlags for StaticCapabilities {
    async fn is_enabled(&self, flag: &str, actor: Option<&Principal>) -> Result<bool, GateError> {
        Ok(self.flag_enabled(flag, actor))
    }
}

#[async_trait]
impl AccessDirectory for StaticCapabilities {
    async fn access_level(
        &self,
        principal: &Principal,
        resource: &ResourceRef,
    ) -> Result<Option<AccessLevel>, GateError> {
        Ok(StaticCapabilities::access_level(self, principal, resource))
    }
}
