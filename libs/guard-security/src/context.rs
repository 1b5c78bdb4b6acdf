use serde::Serialize;

use crate::principal::Principal;

/// Resolved principal plus an optional sudo override.
///
/// The override can only be installed through [`AuthorizationContext::impersonate`],
/// which refuses non-admin principals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationContext {
    principal: Principal,
    sudo: Option<Principal>,
}

/// Returned when a non-admin principal tries to act as someone else.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("only administrators may impersonate other users")]
pub struct ImpersonationRefused;

impl AuthorizationContext {
    #[must_use]
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            sudo: None,
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(Principal::Anonymous)
    }

    /// The principal the credentials resolved to, regardless of sudo.
    #[must_use]
    pub fn original(&self) -> &Principal {
        &self.principal
    }

    /// The principal the request acts as.
    #[must_use]
    pub fn effective(&self) -> &Principal {
        self.sudo.as_ref().unwrap_or(&self.principal)
    }

    #[must_use]
    pub fn is_impersonating(&self) -> bool {
        self.sudo.is_some()
    }

    /// Act as `target` for the rest of the request.
    ///
    /// # Errors
    /// Returns [`ImpersonationRefused`] when the original principal is not an administrator.
    pub fn impersonate(self, target: Principal) -> Result<Self, ImpersonationRefused> {
        if !self.principal.is_admin() {
            return Err(ImpersonationRefused);
        }
        Ok(Self {
            principal: self.principal,
            sudo: Some(target),
        })
    }
}
