//! Scope and capability checks.
//!
//! Checks run in a fixed order and stop at the first failure: coarse scopes,
//! granular permission, role on the resource, then the feature flag for the
//! effective principal.

use capability_resolver_sdk::{AccessDirectory, FeatureFlags};
use guard_security::{AuthError, AuthorizationContext, GateError, Principal};

use crate::registry::RouteParams;
use crate::requirement::{EndpointRequirement, RoleRequirement};

/// Token scope checks. Anonymous principals carry no token and are not
/// scope-checked; whether they may proceed is decided by authentication.
///
/// # Errors
/// `InsufficientScope` or `InsufficientGranularScope`.
pub fn check_scopes(principal: &Principal, requirement: &EndpointRequirement) -> Result<(), AuthError> {
    let Some(scopes) = principal.token_scopes() else {
        return Ok(());
    };
    if !scopes.allows_any(requirement.scopes.as_slice()) {
        return Err(AuthError::insufficient_scope(requirement.scopes.iter().cloned()));
    }
    if let Some(permission) = &requirement.granular_permission
        && !scopes.permits(permission)
    {
        return Err(AuthError::InsufficientGranularScope {
            permission: permission.clone(),
        });
    }
    Ok(())
}

/// Full authorization of the effective principal.
///
/// # Errors
/// The first failing check's [`AuthError`], or a collaborator failure.
pub async fn authorize(
    ctx: &AuthorizationContext,
    requirement: &EndpointRequirement,
    params: &RouteParams,
    flags: &dyn FeatureFlags,
    directory: &dyn AccessDirectory,
) -> Result<(), GateError> {
    let principal = ctx.effective();

    check_scopes(principal, requirement)?;
    if let Some(role) = &requirement.role {
        check_role(principal, role, params, directory).await?;
    }
    if let Some(flag) = &requirement.feature_flag
        && !flags.is_enabled(flag, Some(principal)).await?
    {
        return Err(AuthError::not_found().into());
    }
    Ok(())
}

async fn check_role(
    principal: &Principal,
    role: &RoleRequirement,
    params: &RouteParams,
    directory: &dyn AccessDirectory,
) -> Result<(), GateError> {
    let resource = role.resource.resolve(params).ok_or_else(|| {
        let param = role.resource.param().unwrap_or_default();
        GateError::Internal(format!("route does not capture path parameter '{param}'"))
    })?;

    match directory.access_level(principal, &resource).await? {
        Some(level) if level >= role.level => Ok(()),
        None if resource.kind.conceals_existence() => Err(AuthError::not_found().into()),
        _ => Err(AuthError::Forbidden { reason: None }.into()),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::requirement::ResourceSelector;
    use async_trait::async_trait;
    use guard_security::{
        AccessLevel, AuthMethod, ErrorKind, ResourceKind, ResourceRef, TokenScopes, UserIdentity,
        UserPrincipal, scope,
    };

    struct Flags(&'static [&'static str]);

    #[async_trait]
    impl FeatureFlags for Flags {
        async fn is_enabled(&self, flag: &str, _actor: Option<&Principal>) -> Result<bool, GateError> {
            Ok(self.0.contains(&flag))
        }
    }

    /// Grants `level` on project "1", hides everything else.
    struct Directory(Option<AccessLevel>);

    #[async_trait]
    impl AccessDirectory for Directory {
        async fn access_level(
            &self,
            _principal: &Principal,
            resource: &ResourceRef,
        ) -> Result<Option<AccessLevel>, GateError> {
            let visible = resource.kind == ResourceKind::Instance
                || (resource.kind == ResourceKind::Project && resource.id == "1");
            Ok(if visible { self.0 } else { None })
        }
    }

    struct Down;

    #[async_trait]
    impl AccessDirectory for Down {
        async fn access_level(
            &self,
            _principal: &Principal,
            _resource: &ResourceRef,
        ) -> Result<Option<AccessLevel>, GateError> {
            Err(GateError::Unavailable("directory offline".to_owned()))
        }
    }

    fn user(scopes: TokenScopes) -> Principal {
        Principal::User(UserPrincipal {
            identity: UserIdentity {
                id: 2,
                username: "alice".to_owned(),
                email: "alice@example.com".to_owned(),
                is_admin: false,
            },
            method: AuthMethod::PersonalAccessToken { token_id: 1 },
            scopes,
        })
    }

    fn ctx(scopes: TokenScopes) -> AuthorizationContext {
        AuthorizationContext::new(user(scopes))
    }

    fn project_params(id: &str) -> RouteParams {
        RouteParams::from_pairs([("id", id)])
    }

    async fn run(
        ctx: &AuthorizationContext,
        requirement: &EndpointRequirement,
        params: &RouteParams,
        level: Option<AccessLevel>,
    ) -> Result<(), GateError> {
        authorize(ctx, requirement, params, &Flags(&["on"]), &Directory(level)).await
    }

    #[test]
    fn scopes_must_intersect() {
        let req = EndpointRequirement::required().scopes([scope::API, scope::READ_API]);

        assert!(check_scopes(&user(TokenScopes::limited([scope::READ_API])), &req).is_ok());
        let err = check_scopes(&user(TokenScopes::limited([scope::READ_USER])), &req).unwrap_err();
        assert_eq!(
            err,
            AuthError::insufficient_scope([scope::API, scope::READ_API])
        );
        assert!(check_scopes(&user(TokenScopes::unrestricted()), &req).is_ok());
        assert!(check_scopes(&Principal::Anonymous, &req).is_ok());
    }

    #[test]
    fn widening_scopes_never_turns_allow_into_deny() {
        let all = [
            scope::API,
            scope::READ_API,
            scope::READ_USER,
            scope::READ_REPOSITORY,
            scope::AI_FEATURES,
        ];
        let requirements = [
            EndpointRequirement::required(),
            EndpointRequirement::required().scopes([scope::API]),
            EndpointRequirement::required().scopes([scope::READ_USER, scope::READ_API]),
            EndpointRequirement::required().scopes([scope::AI_FEATURES]),
        ];

        for req in &requirements {
            for mask in 0u32..(1 << all.len()) {
                let granted: Vec<_> = all
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, s)| *s)
                    .collect();
                if check_scopes(&user(TokenScopes::limited(granted.clone())), req).is_err() {
                    continue;
                }
                for extra in all {
                    let mut wider = granted.clone();
                    wider.push(extra);
                    assert!(
                        check_scopes(&user(TokenScopes::limited(wider)), req).is_ok(),
                        "{granted:?} + {extra} denied for {:?}",
                        req.scopes
                    );
                }
            }
        }
    }

    #[test]
    fn granular_permission_is_checked_after_coarse_scope() {
        let req = EndpointRequirement::required()
            .scopes([scope::API])
            .granular_permission("read_issue");

        let coarse_only = TokenScopes::limited([scope::API]);
        assert!(check_scopes(&user(coarse_only), &req).is_ok());

        let granular = TokenScopes::limited([scope::API]).with_granular(["read_issue"]);
        assert!(check_scopes(&user(granular), &req).is_ok());

        let wrong = TokenScopes::limited([scope::API]).with_granular(["update_issue"]);
        assert_eq!(
            check_scopes(&user(wrong), &req).unwrap_err().kind(),
            ErrorKind::InsufficientGranularScope
        );

        let neither = TokenScopes::limited([scope::READ_USER]).with_granular(["update_issue"]);
        assert_eq!(
            check_scopes(&user(neither), &req).unwrap_err().kind(),
            ErrorKind::InsufficientScope
        );
    }

    #[tokio::test]
    async fn role_on_hidden_project_is_not_found() {
        let req = EndpointRequirement::required()
            .role(ResourceSelector::project("id"), AccessLevel::Reporter);
        let ctx = ctx(TokenScopes::unrestricted());

        let err = run(&ctx, &req, &project_params("2"), Some(AccessLevel::Owner))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));

        let err = run(&ctx, &req, &project_params("1"), Some(AccessLevel::Guest))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Forbidden));

        assert!(
            run(&ctx, &req, &project_params("1"), Some(AccessLevel::Reporter))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn instance_role_is_forbidden_not_hidden() {
        let req = EndpointRequirement::required().admin_only();
        let ctx = ctx(TokenScopes::unrestricted());
        let params = RouteParams::default();

        for level in [None, Some(AccessLevel::Guest)] {
            let err = run(&ctx, &req, &params, level).await.unwrap_err();
            assert_eq!(err.kind(), Some(ErrorKind::Forbidden));
        }
        assert!(run(&ctx, &req, &params, Some(AccessLevel::Admin)).await.is_ok());
    }

    #[tokio::test]
    async fn flag_off_is_not_found() {
        let ctx = ctx(TokenScopes::unrestricted());
        let params = RouteParams::default();

        let off = EndpointRequirement::required().feature_flag("off");
        let err = run(&ctx, &off, &params, None).await.unwrap_err();
        assert_eq!(err.as_auth(), Some(&AuthError::not_found()));

        let on = EndpointRequirement::required().feature_flag("on");
        assert!(run(&ctx, &on, &params, None).await.is_ok());
    }

    #[tokio::test]
    async fn first_failure_wins() {
        let req = EndpointRequirement::required()
            .scopes([scope::API])
            .role(ResourceSelector::project("id"), AccessLevel::Owner)
            .feature_flag("off");
        let ctx = ctx(TokenScopes::limited([scope::READ_USER]));

        let err = run(&ctx, &req, &project_params("2"), None).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InsufficientScope));
    }

    #[tokio::test]
    async fn directory_outage_propagates() {
        let req = EndpointRequirement::required()
            .role(ResourceSelector::project("id"), AccessLevel::Guest);
        let ctx = ctx(TokenScopes::unrestricted());
        let err = authorize(&ctx, &req, &project_params("1"), &Flags(&[]), &Down)
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Unavailable(_)));
    }
}
