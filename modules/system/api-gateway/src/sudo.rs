//! Impersonation (sudo).
//!
//! An administrator authenticated with an access token carrying the sudo
//! scope may act as another user for a single request. Every precondition
//! fails closed: a sudo identifier is never silently ignored.

use credential_resolver_sdk::{CredentialResolverClient, UserLookup};
use guard_security::{AuthError, AuthorizationContext, GateError, Principal, UserPrincipal};

pub const NOT_ADMIN: &str = "Must be admin to use sudo";
pub const NOT_TOKEN_AUTHENTICATED: &str =
    "Must be authenticated using an OAuth or personal access token to use sudo";

/// Substitute the effective principal when a sudo identifier is present.
///
/// All-digit identifiers (`^\d+$`) are looked up as ids only; anything else
/// as a username. An admin naming themselves gets their own context back.
///
/// # Errors
/// - `MissingToken` when the caller is anonymous
/// - `Forbidden` when the caller is not an admin or did not use an access token
/// - `InsufficientScope` when the token lacks `required_scope`
/// - `NotFound` when no active user matches
/// - collaborator failures from the user lookup
pub async fn apply_sudo(
    ctx: AuthorizationContext,
    identifier: Option<&str>,
    resolver: &dyn CredentialResolverClient,
    required_scope: &str,
) -> Result<AuthorizationContext, GateError> {
    let Some(identifier) = identifier else {
        return Ok(ctx);
    };

    let admin = match ctx.original() {
        Principal::Anonymous => return Err(AuthError::MissingToken.into()),
        p if !p.is_admin() => return Err(AuthError::forbidden(NOT_ADMIN).into()),
        Principal::User(user) if user.method.is_access_token() => user.clone(),
        _ => return Err(AuthError::forbidden(NOT_TOKEN_AUTHENTICATED).into()),
    };
    if !admin.scopes.contains(required_scope) {
        return Err(AuthError::insufficient_scope([required_scope]).into());
    }

    let not_found = || AuthError::NotFound {
        resource: Some(format!("User with ID or username '{identifier}'")),
    };
    let lookup = parse_identifier(identifier).ok_or_else(not_found)?;
    let target = resolver.find_user(&lookup).await?.ok_or_else(not_found)?;

    if target.id == admin.identity.id {
        return Ok(ctx);
    }

    tracing::info!(
        target: "audit",
        admin_id = admin.identity.id,
        admin_username = %admin.identity.username,
        sudo_user_id = target.id,
        sudo_username = %target.username,
        "sudo"
    );

    let impersonated = Principal::User(UserPrincipal {
        identity: target,
        method: admin.method,
        scopes: admin.scopes,
    });
    ctx.impersonate(impersonated)
        .map_err(|_| AuthError::forbidden(NOT_ADMIN).into())
}

/// `None` for all-digit identifiers too large to be a user id.
fn parse_identifier(identifier: &str) -> Option<UserLookup> {
    let numeric = !identifier.is_empty() && identifier.bytes().all(|b| b.is_ascii_digit());
    if numeric {
        identifier.parse().ok().map(UserLookup::Id)
    } else {
        Some(UserLookup::Username(identifier.to_owned()))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use credential_resolver_sdk::ResolveRequest;
    use guard_security::{
        AuthMethod, DeployTokenPrincipal, ErrorKind, TokenScopes, UserIdentity, scope,
    };

    struct Directory(Vec<UserIdentity>);

    #[async_trait]
    impl CredentialResolverClient for Directory {
        async fn resolve(&self, _request: &ResolveRequest<'_>) -> Result<Principal, GateError> {
            Err(GateError::Internal("not used".to_owned()))
        }

        async fn find_user(&self, lookup: &UserLookup) -> Result<Option<UserIdentity>, GateError> {
            Ok(self
                .0
                .iter()
                .find(|u| match lookup {
                    UserLookup::Id(id) => u.id == *id,
                    UserLookup::Username(name) => u.username == *name,
                })
                .cloned())
        }
    }

    fn identity(id: u64, username: &str, is_admin: bool) -> UserIdentity {
        UserIdentity {
            id,
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            is_admin,
        }
    }

    fn directory() -> Directory {
        Directory(vec![
            identity(1, "root", true),
            identity(2, "alice", false),
            // A username that looks like another user's id.
            identity(3, "2", false),
            identity(4, "-5", false),
        ])
    }

    fn user_ctx(identity: UserIdentity, method: AuthMethod, scopes: &[&str]) -> AuthorizationContext {
        AuthorizationContext::new(Principal::User(UserPrincipal {
            identity,
            method,
            scopes: TokenScopes::limited(scopes.iter().copied()),
        }))
    }

    fn admin_ctx() -> AuthorizationContext {
        user_ctx(
            identity(1, "root", true),
            AuthMethod::PersonalAccessToken { token_id: 10 },
            &[scope::API, scope::SUDO],
        )
    }

    async fn sudo(ctx: AuthorizationContext, id: &str) -> Result<AuthorizationContext, GateError> {
        apply_sudo(ctx, Some(id), &directory(), scope::SUDO).await
    }

    fn kind(result: Result<AuthorizationContext, GateError>) -> Option<ErrorKind> {
        result.unwrap_err().kind()
    }

    #[tokio::test]
    async fn absent_identifier_is_a_no_op() {
        let ctx = AuthorizationContext::anonymous();
        let out = apply_sudo(ctx.clone(), None, &directory(), scope::SUDO)
            .await
            .unwrap();
        assert_eq!(out, ctx);
    }

    #[tokio::test]
    async fn admin_impersonates_by_id_and_username() {
        for id in ["2", "alice"] {
            let ctx = sudo(admin_ctx(), id).await.unwrap();
            assert!(ctx.is_impersonating());
            assert_eq!(ctx.effective().user_id(), Some(2));
            assert_eq!(ctx.original().user_id(), Some(1));
            assert!(ctx.effective().token_scopes().unwrap().contains(scope::API));
        }
    }

    #[tokio::test]
    async fn admin_sudo_to_self_yields_own_context() {
        for id in ["1", "root"] {
            let ctx = sudo(admin_ctx(), id).await.unwrap();
            assert_eq!(ctx, admin_ctx());
        }
    }

    #[tokio::test]
    async fn numeric_identifier_is_never_a_username() {
        // User 3 is named "2"; the identifier "2" still means id 2.
        let ctx = sudo(admin_ctx(), "2").await.unwrap();
        assert_eq!(ctx.effective().user_id(), Some(2));

        assert_eq!(kind(sudo(admin_ctx(), "99").await), Some(ErrorKind::NotFound));
        assert_eq!(
            kind(sudo(admin_ctx(), "99999999999999999999").await),
            Some(ErrorKind::NotFound)
        );
    }

    #[tokio::test]
    async fn signed_identifier_is_a_username() {
        let ctx = sudo(admin_ctx(), "-5").await.unwrap();
        assert_eq!(ctx.effective().user_id(), Some(4));

        let err = sudo(admin_ctx(), "-1").await.unwrap_err();
        assert_eq!(
            err.as_auth(),
            Some(&AuthError::NotFound {
                resource: Some("User with ID or username '-1'".to_owned())
            })
        );
    }

    #[tokio::test]
    async fn unknown_target_is_not_found() {
        let err = sudo(admin_ctx(), "nobody").await.unwrap_err();
        assert_eq!(
            err.as_auth(),
            Some(&AuthError::NotFound {
                resource: Some("User with ID or username 'nobody'".to_owned())
            })
        );
    }

    #[tokio::test]
    async fn non_admin_is_forbidden_whatever_the_target() {
        let alice = user_ctx(
            identity(2, "alice", false),
            AuthMethod::PersonalAccessToken { token_id: 20 },
            &[scope::API, scope::SUDO],
        );
        for id in ["1", "root", "2", "nobody", "!!"] {
            let err = sudo(alice.clone(), id).await.unwrap_err();
            assert_eq!(err.as_auth(), Some(&AuthError::forbidden(NOT_ADMIN)), "{id}");
        }

        let deploy = AuthorizationContext::new(Principal::DeployToken(DeployTokenPrincipal {
            id: 1,
            project_id: 1,
            username: "deployer".to_owned(),
            permissions: TokenScopes::limited([scope::SUDO]),
        }));
        assert_eq!(kind(sudo(deploy, "root").await), Some(ErrorKind::Forbidden));
    }

    #[tokio::test]
    async fn anonymous_caller_must_authenticate() {
        let result = sudo(AuthorizationContext::anonymous(), "root").await;
        assert_eq!(kind(result), Some(ErrorKind::MissingToken));
    }

    #[tokio::test]
    async fn session_admin_cannot_sudo() {
        let ctx = AuthorizationContext::new(Principal::User(UserPrincipal {
            identity: identity(1, "root", true),
            method: AuthMethod::Session,
            scopes: TokenScopes::unrestricted(),
        }));
        let err = sudo(ctx, "alice").await.unwrap_err();
        assert_eq!(err.as_auth(), Some(&AuthError::forbidden(NOT_TOKEN_AUTHENTICATED)));
    }

    #[tokio::test]
    async fn admin_token_needs_sudo_scope() {
        let ctx = user_ctx(
            identity(1, "root", true),
            AuthMethod::OAuth { token_id: 11 },
            &[scope::API],
        );
        let err = sudo(ctx, "alice").await.unwrap_err();
        assert_eq!(
            err.as_auth(),
            Some(&AuthError::insufficient_scope([scope::SUDO]))
        );
    }
}
