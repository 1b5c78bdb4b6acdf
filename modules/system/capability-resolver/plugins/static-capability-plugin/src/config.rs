//! Configuration for the static capability plugin.

use guard_security::{AccessLevel, ResourceKind};
use serde::Deserialize;

/// Plugin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticCapabilityPluginConfig {
    pub flags: Vec<FlagConfig>,
    pub resources: Vec<ResourceConfig>,
    pub memberships: Vec<MembershipConfig>,
}

/// A feature flag, on globally or for selected users.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlagConfig {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    /// User ids the flag is on for when it is not globally enabled.
    #[serde(default)]
    pub users: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Internal,
    #[default]
    Private,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    pub kind: ResourceKind,
    pub id: u64,
    /// Full path, accepted in URLs in place of the id.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Parent group of a project; its members inherit their level.
    #[serde(default)]
    pub group_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MembershipConfig {
    pub user_id: u64,
    pub kind: ResourceKind,
    pub id: u64,
    pub level: AccessLevel,
}
