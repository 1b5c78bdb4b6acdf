//! Router assembly and serving.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use axum::Router;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::handler::Handler;
use axum::http::{Method, Request, Response, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::{MethodFilter, on};
use capability_resolver_sdk::{AccessDirectory, FeatureFlags};
use credential_resolver_sdk::CredentialResolverClient;
use guard_security::GateError;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::field::Empty;

use crate::auth::{GateState, gate_middleware};
use crate::config::GatewayConfig;
use crate::error::{error_response, not_found_response};
use crate::middleware::request_id;
use crate::registry::RouteRegistry;
use crate::requirement::EndpointRequirement;

/// Registers routes together with their requirements and wires the gate.
///
/// ```ignore
/// let router = GatewayBuilder::new(cfg)
///     .with_resolver(resolver)
///     .with_feature_flags(flags)
///     .with_access_directory(directory)
///     .route(Method::GET, "/api/v4/user", EndpointRequirement::required(), current_user)?
///     .build()?;
/// ```
pub struct GatewayBuilder {
    config: GatewayConfig,
    router: Router,
    routes: RouteRegistry,
    resolver: Option<Arc<dyn CredentialResolverClient>>,
    flags: Option<Arc<dyn FeatureFlags>>,
    directory: Option<Arc<dyn AccessDirectory>>,
}

impl GatewayBuilder {
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            router: Router::new(),
            routes: RouteRegistry::new(),
            resolver: None,
            flags: None,
            directory: None,
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn CredentialResolverClient>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn with_feature_flags(mut self, flags: Arc<dyn FeatureFlags>) -> Self {
        self.flags = Some(flags);
        self
    }

    #[must_use]
    pub fn with_access_directory(mut self, directory: Arc<dyn AccessDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Register a gated route. Paths use `{param}` syntax.
    ///
    /// # Errors
    /// Returns an error for methods axum cannot route, for a pattern already
    /// registered for the method, or for a role requirement naming a path
    /// parameter the pattern lacks.
    pub fn route<H, T>(
        mut self,
        method: Method,
        path: &str,
        requirement: EndpointRequirement,
        handler: H,
    ) -> Result<Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let filter = MethodFilter::try_from(method.clone())
            .map_err(|e| anyhow!("cannot route {method} {path}: {e}"))?;
        self.routes.insert(method, path, requirement)?;
        self.router = self.router.route(path, on(filter, handler));
        Ok(self)
    }

    /// Assemble the router with the gate and the ambient middleware stack.
    ///
    /// # Errors
    /// Returns an error if a collaborator was not supplied.
    pub fn build(self) -> Result<Router> {
        let resolver = self
            .resolver
            .context("gateway needs a credential resolver")?;
        let flags = self.flags.context("gateway needs a feature flag source")?;
        let directory = self
            .directory
            .context("gateway needs an access directory")?;

        if self.config.public_url.is_none() {
            tracing::info!(
                "public_url not set, DPoP proofs will be checked against http://<Host> request URLs"
            );
        }

        let body_limit = self.config.defaults.body_limit_bytes;
        let timeout = Duration::from_secs(self.config.defaults.request_timeout_secs);
        let state = GateState {
            resolver,
            flags,
            directory,
            routes: Arc::new(self.routes),
            config: Arc::new(self.config),
        };

        // Layers are added innermost first; the last one added runs first:
        // SetRequestId -> PropagateRequestId -> Trace -> CatchPanic -> Timeout
        // -> BodyLimit -> Gate -> Router
        let mut router = self
            .router
            .fallback(|| async { not_found_response() })
            .layer(from_fn_with_state(state, gate_middleware));

        router = router.layer(RequestBodyLimitLayer::new(body_limit));
        router = router.layer(DefaultBodyLimit::max(body_limit));

        router = router.layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            timeout,
        ));

        router = router.layer(CatchPanicLayer::custom(
            |_: Box<dyn std::any::Any + Send + 'static>| {
                tracing::error!("handler panicked");
                error_response(&GateError::Internal("handler panicked".to_owned()))
            },
        ));

        router = router.layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<Body>| {
                    let rid = req
                        .headers()
                        .get(request_id::header())
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("n/a");

                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        uri = %req.uri().path(),
                        request_id = %rid,
                        principal = Empty,
                        status = Empty,
                        latency_ms = Empty,
                    )
                })
                .on_response(
                    |res: &Response<Body>, latency: Duration, span: &tracing::Span| {
                        span.record("status", res.status().as_u16());
                        span.record("latency_ms", latency.as_millis());
                    },
                ),
        );

        let x_request_id = request_id::header();
        router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
        router = router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

        Ok(router)
    }
}

/// Bind and serve until `cancel` fires.
///
/// # Errors
/// Returns an error if the address is invalid, binding fails or the server
/// stops with an I/O error.
pub async fn serve(router: Router, bind_addr: &str, cancel: CancellationToken) -> Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow!("Invalid bind address '{bind_addr}': {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server bound on {}", addr);

    let shutdown = async move {
        cancel.cancelled().await;
        tracing::info!("HTTP server shutting down gracefully (cancellation)");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
