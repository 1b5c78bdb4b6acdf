//! Error-to-status mapping.
//!
//! Every refusal the gate or a handler raises ends up here exactly once. The
//! mapping from [`ErrorKind`] is total; collaborator failures become generic
//! 500/503 bodies that never carry internal messages.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use guard_security::{AuthError, ErrorKind, GateError};
use serde_json::{Value, json};

/// Status and machine-readable `error` code for each kind.
#[must_use]
pub fn status_for(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::MissingToken => (StatusCode::UNAUTHORIZED, "unauthorized"),
        ErrorKind::TokenNotFound
        | ErrorKind::TokenExpired
        | ErrorKind::TokenRevoked
        | ErrorKind::ImpersonationDisabled => (StatusCode::UNAUTHORIZED, "invalid_token"),
        ErrorKind::InsufficientScope => (StatusCode::FORBIDDEN, "insufficient_scope"),
        ErrorKind::InsufficientGranularScope => {
            (StatusCode::FORBIDDEN, "insufficient_granular_scope")
        }
        ErrorKind::RestrictedClient => (
            StatusCode::UNAUTHORIZED,
            "restricted_language_server_client_error",
        ),
        ErrorKind::DpopValidationFailed => (StatusCode::UNAUTHORIZED, "dpop_error"),
        ErrorKind::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
    }
}

/// Human-readable `message` for a refusal.
#[must_use]
pub fn message(err: &AuthError) -> String {
    match err {
        AuthError::MissingToken => "401 Unauthorized".to_owned(),
        AuthError::TokenNotFound => "Token was not found".to_owned(),
        AuthError::TokenExpired => "Token has expired".to_owned(),
        AuthError::TokenRevoked => "Token has been revoked".to_owned(),
        AuthError::ImpersonationDisabled => {
            "Token is an impersonation token but impersonation was disabled".to_owned()
        }
        AuthError::InsufficientScope { .. } => {
            "The request requires higher privileges than provided by the access token".to_owned()
        }
        AuthError::InsufficientGranularScope { permission } => {
            format!("Access token does not grant the '{permission}' permission")
        }
        AuthError::RestrictedClient(reason) => {
            format!("Language server client is not allowed: {reason}")
        }
        AuthError::DpopValidationFailed(reason) => format!("DPoP validation error: {reason}"),
        AuthError::Forbidden { reason: None } => "403 Forbidden".to_owned(),
        AuthError::Forbidden {
            reason: Some(reason),
        } => format!("403 Forbidden - {reason}"),
        AuthError::NotFound { resource: None } => "404 Not Found".to_owned(),
        AuthError::NotFound {
            resource: Some(resource),
        } => format!("404 {resource} Not Found"),
    }
}

/// Final response for any gate failure.
#[must_use]
pub fn error_response(err: &GateError) -> Response {
    match err {
        GateError::Auth(auth) => auth_error_response(auth),
        GateError::Unavailable(_) => json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            &json!({ "error": "service_unavailable", "message": "503 Service Unavailable" }),
        ),
        GateError::Internal(_) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "error": "internal_error", "message": "500 Internal Server Error" }),
        ),
    }
}

/// Body for unknown routes and hidden resources alike.
#[must_use]
pub fn not_found_response() -> Response {
    auth_error_response(&AuthError::not_found())
}

fn auth_error_response(err: &AuthError) -> Response {
    let kind = err.kind();
    let (status, code) = status_for(kind);
    let message = message(err);

    let mut body = json!({ "error": code, "message": message });
    if let AuthError::InsufficientScope { required } = err {
        body["scope"] = Value::String(required.join(" "));
    }

    let mut response = json_response(status, &body);
    if let Some(challenge) = challenge(kind, code, &message) {
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, challenge);
    }
    response
}

/// `WWW-Authenticate` value for token failures. Plain role refusals carry none.
fn challenge(kind: ErrorKind, code: &str, message: &str) -> Option<HeaderValue> {
    let value = match kind {
        ErrorKind::Forbidden | ErrorKind::NotFound => return None,
        ErrorKind::MissingToken => "Bearer realm=\"api\"".to_owned(),
        _ => format!(
            "Bearer realm=\"api\", error=\"{code}\", error_description=\"{}\"",
            quoted(message)
        ),
    };
    HeaderValue::from_str(&value).ok()
}

fn quoted(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '"' | '\\' => '\'',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '?',
        })
        .collect()
}

fn json_response(status: StatusCode, body: &Value) -> Response {
    (status, axum::Json(body)).into_response()
}

/// A refusal raised by a handler, rendered exactly like one from the gate.
///
/// ```ignore
/// async fn handler(Authorized(ctx): Authorized) -> Result<Json<Value>, GateRejection> {
///     Err(AuthError::forbidden("Project is archived"))?
/// }
/// ```
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct GateRejection(pub GateError);

impl From<AuthError> for GateRejection {
    fn from(e: AuthError) -> Self {
        Self(e.into())
    }
}

impl From<GateError> for GateRejection {
    fn from(e: GateError) -> Self {
        Self(e)
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        error_response(&self.0)
    }
}
