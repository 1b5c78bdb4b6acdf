//! In-memory flags and access levels.

use std::collections::HashMap;

use guard_security::{AccessLevel, Principal, ResourceKind, ResourceRef};

use crate::config::{FlagConfig, ResourceConfig, StaticCapabilityPluginConfig, Visibility};

/// Capability lookups backed by configuration. Immutable after construction.
pub struct StaticCapabilities {
    flags: HashMap<String, FlagConfig>,
    resources: HashMap<(ResourceKind, u64), ResourceConfig>,
    /// Lower-cased full path to id.
    paths: HashMap<(ResourceKind, String), u64>,
    memberships: HashMap<(u64, ResourceKind, u64), AccessLevel>,
}

impl StaticCapabilities {
    #[must_use]
    pub fn from_config(cfg: &StaticCapabilityPluginConfig) -> Self {
        let flags = cfg
            .flags
            .iter()
            .map(|f| (f.name.clone(), f.clone()))
            .collect();
        let resources = cfg
            .resources
            .iter()
            .map(|r| ((r.kind, r.id), r.clone()))
            .collect();
        let paths = cfg
            .resources
            .iter()
            .filter_map(|r| Some(((r.kind, r.path.as_ref()?.to_lowercase()), r.id)))
            .collect();
        let memberships = cfg
            .memberships
            .iter()
            .map(|m| ((m.user_id, m.kind, m.id), m.level))
            .collect();

        tracing::debug!(
            flags = cfg.flags.len(),
            resources = cfg.resources.len(),
            memberships = cfg.memberships.len(),
            "static capabilities loaded"
        );

        Self {
            flags,
            resources,
            paths,
            memberships,
        }
    }

    pub(crate) fn flag_enabled(&self, name: &str, actor: Option<&Principal>) -> bool {
        let Some(flag) = self.flags.get(name) else {
            return false;
        };
        if flag.enabled {
            return true;
        }
        match actor {
            None => !flag.users.is_empty(),
            Some(principal) => principal
                .user_id()
                .is_some_and(|id| flag.users.contains(&id)),
        }
    }

    pub(crate) fn access_level(
        &self,
        principal: &Principal,
        resource: &ResourceRef,
    ) -> Option<AccessLevel> {
        if resource.kind == ResourceKind::Instance {
            return match principal {
                Principal::Anonymous => None,
                p if p.is_admin() => Some(AccessLevel::Admin),
                _ => Some(AccessLevel::Guest),
            };
        }

        let found = self.find(resource.kind, &resource.id)?;
        if principal.is_admin() {
            return Some(AccessLevel::Admin);
        }
        if let Principal::DeployToken(token) = principal {
            return (found.kind == ResourceKind::Project && found.id == token.project_id)
                .then_some(AccessLevel::Reporter);
        }

        let visible = match found.visibility {
            Visibility::Public => true,
            Visibility::Internal => principal.user_id().is_some(),
            Visibility::Private => false,
        };
        let member = principal.user_id().and_then(|user_id| {
            let direct = self.memberships.get(&(user_id, found.kind, found.id)).copied();
            let inherited = found
                .group_id
                .and_then(|group| self.memberships.get(&(user_id, ResourceKind::Group, group)))
                .copied();
            direct.max(inherited)
        });

        member.max(visible.then_some(AccessLevel::Guest))
    }

    /// Resources are addressed by numeric id or by full path.
    fn find(&self, kind: ResourceKind, key: &str) -> Option<&ResourceConfig> {
        let id = match key.parse::<u64>() {
            Ok(id) => id,
            Err(_) => *self.paths.get(&(kind, key.to_lowercase()))?,
        };
        self.resources.get(&(kind, id))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use guard_security::{
        AuthMethod, DeployTokenPrincipal, JobTokenPrincipal, TokenScopes, UserIdentity,
        UserPrincipal,
    };
    use serde_json::json;

    fn capabilities() -> StaticCapabilities {
        let cfg: StaticCapabilityPluginConfig = serde_json::from_value(json!({
            "flags": [
                { "name": "everyone", "enabled": true },
                { "name": "beta", "users": [2] },
                { "name": "off" }
            ],
            "resources": [
                { "kind": "group", "id": 3, "path": "acme", "visibility": "private" },
                { "kind": "project", "id": 7, "path": "acme/web", "visibility": "private", "group_id": 3 },
                { "kind": "project", "id": 8, "visibility": "public" },
                { "kind": "project", "id": 9, "visibility": "internal" }
            ],
            "memberships": [
                { "user_id": 2, "kind": "project", "id": 7, "level": "developer" },
                { "user_id": 4, "kind": "group", "id": 3, "level": "owner" }
            ]
        }))
        .unwrap();
        StaticCapabilities::from_config(&cfg)
    }

    fn user(id: u64, is_admin: bool) -> Principal {
        Principal::User(UserPrincipal {
            identity: UserIdentity {
                id,
                username: format!("user{id}"),
                email: format!("user{id}@example.com"),
                is_admin,
            },
            method: AuthMethod::Session,
            scopes: TokenScopes::unrestricted(),
        })
    }

    #[test]
    fn flags() {
        let caps = capabilities();
        assert!(caps.flag_enabled("everyone", None));
        assert!(caps.flag_enabled("beta", None));
        assert!(caps.flag_enabled("beta", Some(&user(2, false))));
        assert!(!caps.flag_enabled("beta", Some(&user(5, false))));
        assert!(!caps.flag_enabled("off", None));
        assert!(!caps.flag_enabled("missing", Some(&user(2, false))));
    }

    #[test]
    fn instance_levels() {
        let caps = capabilities();
        let instance = ResourceRef::instance();
        assert_eq!(caps.access_level(&Principal::Anonymous, &instance), None);
        assert_eq!(caps.access_level(&user(2, false), &instance), Some(AccessLevel::Guest));
        assert_eq!(caps.access_level(&user(1, true), &instance), Some(AccessLevel::Admin));
    }

    #[test]
    fn membership_by_id_and_path() {
        let caps = capabilities();
        let alice = user(2, false);
        assert_eq!(
            caps.access_level(&alice, &ResourceRef::project("7")),
            Some(AccessLevel::Developer)
        );
        assert_eq!(
            caps.access_level(&alice, &ResourceRef::project("ACME/web")),
            Some(AccessLevel::Developer)
        );
        assert_eq!(caps.access_level(&alice, &ResourceRef::group("3")), None);
    }

    #[test]
    fn group_members_inherit_project_access() {
        let caps = capabilities();
        assert_eq!(
            caps.access_level(&user(4, false), &ResourceRef::project("7")),
            Some(AccessLevel::Owner)
        );
    }

    #[test]
    fn visibility() {
        let caps = capabilities();
        let stranger = user(5, false);
        assert_eq!(caps.access_level(&stranger, &ResourceRef::project("7")), None);
        assert_eq!(
            caps.access_level(&stranger, &ResourceRef::project("8")),
            Some(AccessLevel::Guest)
        );
        assert_eq!(
            caps.access_level(&stranger, &ResourceRef::project("9")),
            Some(AccessLevel::Guest)
        );
        assert_eq!(
            caps.access_level(&Principal::Anonymous, &ResourceRef::project("8")),
            Some(AccessLevel::Guest)
        );
        assert_eq!(caps.access_level(&Principal::Anonymous, &ResourceRef::project("9")), None);
    }

    #[test]
    fn admins_see_every_configured_resource() {
        let caps = capabilities();
        let admin = user(1, true);
        assert_eq!(
            caps.access_level(&admin, &ResourceRef::project("7")),
            Some(AccessLevel::Admin)
        );
        assert_eq!(caps.access_level(&admin, &ResourceRef::project("404")), None);
    }

    #[test]
    fn deploy_tokens_read_their_own_project_only() {
        let caps = capabilities();
        let token = Principal::DeployToken(DeployTokenPrincipal {
            id: 1,
            project_id: 7,
            username: "deployer".to_owned(),
            permissions: TokenScopes::limited(["read_repository"]),
        });
        assert_eq!(
            caps.access_level(&token, &ResourceRef::project("7")),
            Some(AccessLevel::Reporter)
        );
        assert_eq!(caps.access_level(&token, &ResourceRef::project("8")), None);
        assert_eq!(caps.access_level(&token, &ResourceRef::group("3")), None);
    }

    #[test]
    fn job_tokens_act_as_their_user() {
        let caps = capabilities();
        let job = Principal::JobToken(JobTokenPrincipal {
            id: 50,
            project_id: 7,
            user_id: 2,
        });
        assert_eq!(
            caps.access_level(&job, &ResourceRef::project("7")),
            Some(AccessLevel::Developer)
        );
    }
}
