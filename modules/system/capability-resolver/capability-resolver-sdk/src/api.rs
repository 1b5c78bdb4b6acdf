//! Collaborator traits consumed by the gateway.

use async_trait::async_trait;
use guard_security::{AccessLevel, GateError, Principal, ResourceRef};

/// Feature flag evaluation.
#[async_trait]
pub trait FeatureFlags: Send + Sync {
    /// Whether `flag` is on.
    ///
    /// With `actor` set to `None` the question is "is this flag enabled for
    /// anyone at all"; with an actor it is "is it enabled for this caller".
    /// Unknown flags are off.
    ///
    /// # Errors
    /// `GateError::Unavailable` / `GateError::Internal` if the flag source fails.
    async fn is_enabled(&self, flag: &str, actor: Option<&Principal>) -> Result<bool, GateError>;
}

/// Resource access levels.
#[async_trait]
pub trait AccessDirectory: Send + Sync {
    /// The principal's access level on `resource`.
    ///
    /// `None` means the resource does not exist or is not visible to the
    /// principal; callers must not distinguish the two.
    ///
    /// # Errors
    /// `GateError::Unavailable` / `GateError::Internal` if the directory fails.
    async fn access_level(
        &self,
        principal: &Principal,
        resource: &ResourceRef,
    ) -> Result<Option<AccessLevel>, GateError>;
}
