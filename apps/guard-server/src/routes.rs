//! Demo API surface behind the gate.

use std::sync::Arc;

use anyhow::{Context, Result};
use api_gateway::{Authorized, EndpointRequirement, GateRejection, GatewayBuilder, ResourceSelector};
use axum::extract::Path;
use axum::http::{Method, StatusCode};
use axum::{Json, Router};
use credential_resolver::{CredentialResolverLocalClient, Service};
use credential_resolver_sdk::CredentialStore;
use guard_security::{AccessLevel, AuthError, Principal, UserIdentity, scope};
use serde_json::{Value, json};
use static_capability_plugin::StaticCapabilities;
use static_credential_plugin::StaticCredentialStore;

use crate::config::AppConfig;

/// Wire the configured collaborators and register every demo route.
///
/// # Errors
/// Returns an error for an invalid resolver configuration or a route that
/// fails to register.
pub fn router(cfg: &AppConfig) -> Result<Router> {
    let store: Arc<dyn CredentialStore> =
        Arc::new(StaticCredentialStore::from_config(&cfg.credentials));
    let service =
        Service::new(store, cfg.resolver.clone()).context("invalid resolver configuration")?;
    let resolver = Arc::new(CredentialResolverLocalClient::new(Arc::new(service)));
    let capabilities = Arc::new(StaticCapabilities::from_config(&cfg.capabilities));

    let settings = Arc::new(json!({
        "impersonation_enabled": cfg.resolver.impersonation_enabled,
        "dpop_max_age_secs": cfg.resolver.dpop.max_age_secs,
        "language_server_minimum_version": cfg.resolver.language_server.minimum_version,
        "sudo_scope": cfg.gateway.sudo.required_scope,
    }));

    GatewayBuilder::new(cfg.gateway.clone())
        .with_resolver(resolver)
        .with_feature_flags(capabilities.clone())
        .with_access_directory(capabilities)
        .route(
            Method::GET,
            "/api/v4/version",
            EndpointRequirement::optional(),
            version,
        )?
        .route(
            Method::GET,
            "/api/v4/user",
            EndpointRequirement::required().scopes([
                scope::API,
                scope::READ_API,
                scope::READ_USER,
            ]),
            current_user,
        )?
        .route(
            Method::GET,
            "/api/v4/application/settings",
            EndpointRequirement::required()
                .scopes([scope::API, scope::READ_API])
                .admin_only(),
            move || {
                let settings = Arc::clone(&settings);
                async move { Json(Value::clone(&settings)) }
            },
        )?
        .route(
            Method::GET,
            "/api/v4/projects/{id}",
            EndpointRequirement::optional()
                .scopes([scope::API, scope::READ_API, scope::READ_REPOSITORY])
                .role(ResourceSelector::project("id"), AccessLevel::Guest)
                .allow_deploy_token(),
            project,
        )?
        .route(
            Method::GET,
            "/api/v4/projects/{id}/issues",
            EndpointRequirement::required()
                .scopes([scope::API, scope::READ_API])
                .granular_permission("read_issue")
                .role(ResourceSelector::project("id"), AccessLevel::Reporter),
            project_issues,
        )?
        .route(
            Method::GET,
            "/api/v4/job",
            EndpointRequirement::required().allow_job_token(),
            current_job,
        )?
        .route(
            Method::DELETE,
            "/api/v4/groups/{id}/dependency_proxy/cache",
            EndpointRequirement::required()
                .scopes([scope::API])
                .role(ResourceSelector::group("id"), AccessLevel::Owner)
                .feature_flag("dependency_proxy_cache_purge"),
            purge_dependency_proxy_cache,
        )?
        .route(
            Method::POST,
            "/api/v4/code_suggestions/completions",
            EndpointRequirement::required()
                .scopes([scope::AI_FEATURES, scope::API])
                .restrict_language_server_clients(),
            code_completions,
        )?
        .build()
}

async fn version() -> Json<Value> {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

async fn current_user(Authorized(ctx): Authorized) -> Result<Json<UserIdentity>, GateRejection> {
    let user = ctx
        .effective()
        .as_user()
        .ok_or_else(|| AuthError::forbidden("Only users have a profile"))?;
    Ok(Json(user.identity.clone()))
}

async fn project(Authorized(ctx): Authorized, Path(id): Path<String>) -> Json<Value> {
    Json(json!({ "id": id, "accessed_as": ctx.effective().kind() }))
}

async fn project_issues(Path(id): Path<String>) -> Json<Value> {
    Json(json!({ "project": id, "issues": [] }))
}

async fn current_job(Authorized(ctx): Authorized) -> Result<Json<Value>, GateRejection> {
    let Principal::JobToken(job) = ctx.effective() else {
        return Err(AuthError::forbidden("Job token required").into());
    };
    Ok(Json(json!({
        "id": job.id,
        "project_id": job.project_id,
        "user_id": job.user_id,
    })))
}

async fn purge_dependency_proxy_cache(Path(id): Path<String>) -> StatusCode {
    tracing::info!(group = %id, "dependency proxy cache purge scheduled");
    StatusCode::ACCEPTED
}

async fn code_completions(Authorized(ctx): Authorized) -> Json<Value> {
    Json(json!({ "user_id": ctx.effective().user_id(), "choices": [] }))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        let cfg: AppConfig = serde_json::from_value(json!({
            "credentials": {
                "users": [
                    { "id": 1, "username": "root", "email": "root@example.com", "is_admin": true },
                    { "id": 2, "username": "alice", "email": "alice@example.com" }
                ],
                "tokens": [
                    { "token": "root-pat", "credential": { "type": "access_token", "id": 10, "user_id": 1, "scopes": ["api"] } },
                    { "token": "alice-pat", "credential": { "type": "access_token", "id": 20, "user_id": 2, "scopes": ["api"] } },
                    { "token": "job-1", "credential": { "type": "job_token", "job_id": 5, "project_id": 7, "user_id": 2, "running": true } }
                ]
            },
            "capabilities": {
                "flags": [{ "name": "dependency_proxy_cache_purge", "users": [1] }],
                "resources": [
                    { "kind": "group", "id": 9 },
                    { "kind": "project", "id": 7, "group_id": 9 }
                ],
                "memberships": [{ "user_id": 2, "kind": "group", "id": 9, "level": "owner" }]
            }
        }))
        .unwrap();
        router(&cfg).unwrap()
    }

    async fn call(method: Method, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header("private-token", token);
        }
        let res = app()
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn version_is_public() {
        let (status, body) = call(Method::GET, "/api/v4/version", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn current_user_profile() {
        let (status, body) = call(Method::GET, "/api/v4/user", Some("alice-pat")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");

        let (status, body) = call(Method::GET, "/api/v4/user", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn settings_are_admin_only() {
        let (status, _) = call(Method::GET, "/api/v4/application/settings", Some("alice-pat")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) =
            call(Method::GET, "/api/v4/application/settings", Some("root-pat")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sudo_scope"], "sudo");
    }

    #[tokio::test]
    async fn job_details_need_a_job_token() {
        let (status, body) = call(Method::GET, "/api/v4/job", Some("job-1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 5);

        let (status, body) = call(Method::GET, "/api/v4/job", Some("alice-pat")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "403 Forbidden - Job token required");
    }

    #[tokio::test]
    async fn cache_purge_is_flagged() {
        let uri = "/api/v4/groups/9/dependency_proxy/cache";
        let (status, _) = call(Method::DELETE, uri, Some("root-pat")).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (status, body) = call(Method::DELETE, uri, Some("alice-pat")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }
}
