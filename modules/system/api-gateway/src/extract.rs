//! Axum extractor for the gate's outcome.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use guard_security::{AuthorizationContext, GateError};

use crate::error::GateRejection;

/// Extractor for the `AuthorizationContext` - requires the route to be gated.
///
/// ```ignore
/// async fn me(Authorized(ctx): Authorized) -> Json<Principal> {
///     Json(ctx.effective().clone())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authorized(pub AuthorizationContext);

impl<S> FromRequestParts<S> for Authorized
where
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthorizationContext>()
            .cloned()
            .map(Authorized)
            .ok_or_else(|| {
                GateRejection(GateError::Internal(
                    "AuthorizationContext not found - route is not registered with the gate"
                        .to_owned(),
                ))
            })
    }
}
