//! Role levels and the resources they are held on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role a principal holds on a resource, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Guest,
    Reporter,
    Developer,
    Maintainer,
    Owner,
    /// Instance administrator; implied on every resource for admins.
    Admin,
}

impl AccessLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Reporter => "reporter",
            Self::Developer => "developer",
            Self::Maintainer => "maintainer",
            Self::Owner => "owner",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of resource a role requirement applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// The whole installation; used for admin-only endpoints.
    Instance,
    Group,
    Project,
}

impl ResourceKind {
    /// Whether a caller without visibility must be told the resource does not exist.
    #[must_use]
    pub fn conceals_existence(self) -> bool {
        !matches!(self, Self::Instance)
    }
}

/// A concrete resource, identified by numeric id or full path as it appeared in the URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: String,
}

impl ResourceRef {
    #[must_use]
    pub fn instance() -> Self {
        Self {
            kind: ResourceKind::Instance,
            id: String::new(),
        }
    }

    #[must_use]
    pub fn project(id: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Project,
            id: id.into(),
        }
    }

    #[must_use]
    pub fn group(id: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Group,
            id: id.into(),
        }
    }
}
