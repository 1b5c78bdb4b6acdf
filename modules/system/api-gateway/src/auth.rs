//! The request gate.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, header, request::Parts};
use axum::middleware::Next;
use axum::response::Response;
use capability_resolver_sdk::{AccessDirectory, FeatureFlags};
use credential_resolver_sdk::{ClientFacts, CredentialResolverClient, ResolveRequest};
use guard_security::{AuthError, AuthorizationContext, GateError};

use crate::authorize::authorize;
use crate::config::GatewayConfig;
use crate::credentials::{QueryParams, extract_claim, header_value, sudo_identifier};
use crate::error::error_response;
use crate::registry::{ResolvedRoute, RouteRegistry};
use crate::sudo::apply_sudo;

/// Shared state for the gate middleware.
#[derive(Clone)]
pub struct GateState {
    pub resolver: Arc<dyn CredentialResolverClient>,
    pub flags: Arc<dyn FeatureFlags>,
    pub directory: Arc<dyn AccessDirectory>,
    pub routes: Arc<RouteRegistry>,
    pub config: Arc<GatewayConfig>,
}

/// Gate middleware.
///
/// For each request:
/// 1. Skips CORS preflight requests
/// 2. Looks up the route requirement; unregistered routes pass through to the fallback
/// 3. Hides routes whose feature flag is off for everyone
/// 4. Extracts and resolves the credential, applies sudo, authorizes
/// 5. Inserts the `AuthorizationContext` or answers with the mapped error
pub async fn gate_middleware(
    State(state): State<GateState>,
    req: Request,
    next: Next,
) -> Response {
    if is_preflight_request(req.method(), req.headers()) {
        return next.run(req).await;
    }
    let Some(route) = state.routes.resolve(req.method(), req.uri().path()) else {
        return next.run(req).await;
    };

    let (mut parts, body) = req.into_parts();
    match state.admit(&parts, &route).await {
        Ok(ctx) => {
            tracing::Span::current().record("principal", ctx.effective().kind());
            parts.extensions.insert(ctx);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(err) => {
            log_gate_error(&err);
            error_response(&err)
        }
    }
}

impl GateState {
    async fn admit(
        &self,
        parts: &Parts,
        route: &ResolvedRoute,
    ) -> Result<AuthorizationContext, GateError> {
        let requirement = &route.requirement;
        let carriers = &self.config.carriers;

        if let Some(flag) = &requirement.feature_flag
            && !self.flags.is_enabled(flag, None).await?
        {
            return Err(AuthError::not_found().into());
        }

        let query = QueryParams::parse(parts.uri.query());
        let claim = extract_claim(&parts.headers, &query, carriers);
        let url = request_url(self.config.public_url.as_deref(), parts);
        let client = ClientFacts {
            method: parts.method.as_str(),
            url: &url,
            dpop_proof: header_value(&parts.headers, &carriers.dpop_header),
            user_agent: header_value(&parts.headers, header::USER_AGENT.as_str()),
        };
        let request = ResolveRequest::new(&claim)
            .route(requirement.route_settings())
            .client(client);
        let principal = self.resolver.resolve(&request).await?;

        let sudo = sudo_identifier(&parts.headers, &query, carriers);
        let ctx = apply_sudo(
            AuthorizationContext::new(principal),
            sudo.as_deref(),
            self.resolver.as_ref(),
            &self.config.sudo.required_scope,
        )
        .await?;

        authorize(
            &ctx,
            requirement,
            &route.params,
            self.flags.as_ref(),
            self.directory.as_ref(),
        )
        .await?;
        Ok(ctx)
    }
}

/// Absolute request URL without query, as a client would have signed it.
fn request_url(public_url: Option<&str>, parts: &Parts) -> String {
    let path = parts.uri.path();
    if let Some(base) = public_url {
        return format!("{}{path}", base.trim_end_matches('/'));
    }
    let host = header_value(&parts.headers, header::HOST.as_str())
        .or_else(|| parts.uri.authority().map(http::uri::Authority::as_str))
        .unwrap_or("localhost");
    format!("http://{host}{path}")
}

/// Log gate failures at appropriate levels.
#[allow(clippy::cognitive_complexity)]
fn log_gate_error(err: &GateError) {
    match err {
        GateError::Auth(auth) => tracing::debug!(kind = %auth.kind(), "request refused: {auth}"),
        GateError::Unavailable(msg) => tracing::error!("gate collaborator unavailable: {msg}"),
        GateError::Internal(msg) => tracing::error!("gate internal error: {msg}"),
    }
}

/// Check if this is a CORS preflight request
///
/// Preflight requests are OPTIONS requests with:
/// - Origin header present
/// - Access-Control-Request-Method header present
fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(header::ORIGIN)
        && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}
