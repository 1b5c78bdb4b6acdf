//! Credential extraction.
//!
//! A request may carry several credentials; exactly one is used. Precedence,
//! highest first:
//!
//! 1. `Authorization: Bearer <token>`
//! 2. private-token header
//! 3. private-token query parameter
//! 4. `Authorization: Basic <user:token>`
//! 5. session cookie
//!
//! Lower-precedence carriers are ignored, not validated. Blank values count as
//! absent. Extraction is pure: nothing is looked up here.

use axum::http::{HeaderMap, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use credential_resolver_sdk::CredentialClaim;
use secrecy::SecretString;

use crate::config::CarrierNames;

/// Decoded query string pairs.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// A malformed query string yields no parameters.
    #[must_use]
    pub fn parse(query: Option<&str>) -> Self {
        let Some(query) = query else {
            return Self::default();
        };
        match serde_urlencoded::from_str(query) {
            Ok(pairs) => Self(pairs),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed query string");
                Self::default()
            }
        }
    }

    /// First non-blank value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == name)
            .find_map(|(_, v)| non_blank(v))
    }
}

/// Pick the credential the request authenticates with.
#[must_use]
pub fn extract_claim(headers: &HeaderMap, query: &QueryParams, names: &CarrierNames) -> CredentialClaim {
    let authorization = header_value(headers, header::AUTHORIZATION.as_str());

    if let Some(token) = authorization.and_then(|v| strip_scheme(v, "Bearer")) {
        return CredentialClaim::BearerToken(secret(token));
    }
    if let Some(token) = header_value(headers, &names.private_token_header) {
        return CredentialClaim::PrivateTokenHeader(secret(token));
    }
    if let Some(token) = query.get(&names.private_token_param) {
        return CredentialClaim::PrivateTokenParam(secret(token));
    }
    if let Some((username, password)) = authorization.and_then(parse_basic) {
        return CredentialClaim::BasicAuth {
            username,
            password: SecretString::from(password),
        };
    }
    if let Some(session) = cookie_value(headers, &names.session_cookie) {
        return CredentialClaim::SessionCookie(secret(session));
    }
    CredentialClaim::None
}

/// The impersonation target, if any. The query parameter wins over the header.
#[must_use]
pub fn sudo_identifier(headers: &HeaderMap, query: &QueryParams, names: &CarrierNames) -> Option<String> {
    query
        .get(&names.sudo_param)
        .or_else(|| header_value(headers, &names.sudo_header))
        .map(str::to_owned)
}

/// Trimmed, non-blank header value. Non-UTF-8 values are treated as absent.
#[must_use]
pub fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(non_blank)
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_owned())
}

/// Case-insensitive auth scheme match, returning the non-blank credential.
fn strip_scheme<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
    let (name, rest) = value.split_once(' ')?;
    if !name.eq_ignore_ascii_case(scheme) {
        return None;
    }
    non_blank(rest)
}

fn parse_basic(authorization: &str) -> Option<(String, String)> {
    let encoded = strip_scheme(authorization, "Basic")?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    let password = non_blank(password)?;
    Some((username.to_owned(), password.to_owned()))
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .and_then(|(_, v)| non_blank(v))
}
