//! Declarative per-route access requirements.

use credential_resolver_sdk::RouteAuthSettings;
use guard_security::{AccessLevel, ResourceRef};

use crate::registry::RouteParams;

/// Whether a route needs a caller identity at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Authentication {
    #[default]
    Required,
    /// Anonymous callers are let through as [`guard_security::Principal::Anonymous`].
    Optional,
}

/// Where the resource a role requirement applies to comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSelector {
    Instance,
    /// Project named by a path parameter (numeric id or full path).
    Project { param: String },
    Group { param: String },
}

impl ResourceSelector {
    #[must_use]
    pub fn project(param: impl Into<String>) -> Self {
        Self::Project {
            param: param.into(),
        }
    }

    #[must_use]
    pub fn group(param: impl Into<String>) -> Self {
        Self::Group {
            param: param.into(),
        }
    }

    /// Path parameter the selector reads, if any.
    #[must_use]
    pub fn param(&self) -> Option<&str> {
        match self {
            Self::Instance => None,
            Self::Project { param } | Self::Group { param } => Some(param),
        }
    }

    /// `None` if the path parameter is missing from the match.
    #[must_use]
    pub fn resolve(&self, params: &RouteParams) -> Option<ResourceRef> {
        match self {
            Self::Instance => Some(ResourceRef::instance()),
            Self::Project { param } => params.get(param).map(ResourceRef::project),
            Self::Group { param } => params.get(param).map(ResourceRef::group),
        }
    }
}

/// Minimum access level on a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRequirement {
    pub resource: ResourceSelector,
    pub level: AccessLevel,
}

/// Everything a route asks of its caller. Immutable once registered.
///
/// ```ignore
/// EndpointRequirement::required()
///     .scopes([scope::API, scope::READ_API])
///     .granular_permission("read_issue")
///     .role(ResourceSelector::project("id"), AccessLevel::Reporter)
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct EndpointRequirement {
    pub authentication: Authentication,
    /// Any one of these scopes is enough. Empty means no scope check.
    pub scopes: Vec<String>,
    pub granular_permission: Option<String>,
    pub role: Option<RoleRequirement>,
    pub feature_flag: Option<String>,
    pub allow_job_token: bool,
    pub allow_deploy_token: bool,
    pub restrict_language_server_clients: bool,
}

impl EndpointRequirement {
    #[must_use]
    pub fn required() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn optional() -> Self {
        Self {
            authentication: Authentication::Optional,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn granular_permission(mut self, permission: impl Into<String>) -> Self {
        self.granular_permission = Some(permission.into());
        self
    }

    #[must_use]
    pub fn role(mut self, resource: ResourceSelector, level: AccessLevel) -> Self {
        self.role = Some(RoleRequirement { resource, level });
        self
    }

    /// Shorthand for an instance-wide `admin` role.
    #[must_use]
    pub fn admin_only(self) -> Self {
        self.role(ResourceSelector::Instance, AccessLevel::Admin)
    }

    #[must_use]
    pub fn feature_flag(mut self, flag: impl Into<String>) -> Self {
        self.feature_flag = Some(flag.into());
        self
    }

    #[must_use]
    pub fn allow_job_token(mut self) -> Self {
        self.allow_job_token = true;
        self
    }

    #[must_use]
    pub fn allow_deploy_token(mut self) -> Self {
        self.allow_deploy_token = true;
        self
    }

    #[must_use]
    pub fn restrict_language_server_clients(mut self) -> Self {
        self.restrict_language_server_clients = true;
        self
    }

    /// The subset the credential resolver needs.
    #[must_use]
    pub fn route_settings(&self) -> RouteAuthSettings {
        RouteAuthSettings {
            auth_optional: self.authentication == Authentication::Optional,
            allow_job_token: self.allow_job_token,
            allow_deploy_token: self.allow_deploy_token,
            restrict_language_server_clients: self.restrict_language_server_clients,
        }
    }
}
