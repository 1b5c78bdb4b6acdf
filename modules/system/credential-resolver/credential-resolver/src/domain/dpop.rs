//! `DPoP` proof validation for sender-constrained access tokens.
//!
//! Only what is needed to check a proof against an already bound token is
//! implemented: header shape, key thumbprint, signature, `htm`, `htu`, `ath`
//! and `iat` freshness. Replay tracking by `jti` is left to the store.

use std::collections::{BTreeMap, HashSet};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::DpopConfig;

pub const PROOF_TYPE: &str = "dpop+jwt";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DpopError {
    #[error("DPoP proof is missing")]
    Missing,

    #[error("malformed DPoP proof: {0}")]
    Malformed(String),

    #[error("DPoP proof typ must be '{PROOF_TYPE}'")]
    WrongType,

    #[error("DPoP proof must use an asymmetric algorithm")]
    SymmetricAlgorithm,

    #[error("DPoP proof header has no jwk")]
    MissingKey,

    #[error("DPoP key does not match the token binding")]
    KeyMismatch,

    #[error("DPoP proof signature is invalid")]
    InvalidSignature,

    #[error("DPoP htm does not match the request method")]
    MethodMismatch,

    #[error("DPoP htu does not match the request URL")]
    UrlMismatch,

    #[error("DPoP ath does not match the access token")]
    AccessTokenHashMismatch,

    #[error("DPoP proof is too old")]
    Stale,

    #[error("DPoP proof is issued in the future")]
    IssuedInFuture,
}

#[derive(Debug, Deserialize)]
struct ProofClaims {
    htm: String,
    htu: String,
    iat: i64,
    ath: Option<String>,
    #[allow(dead_code)]
    jti: String,
}

/// What the proof must be bound to.
#[derive(Debug, Clone, Copy)]
pub struct ProofBinding<'a> {
    /// RFC 7638 thumbprint recorded on the token.
    pub jkt: &'a str,
    pub access_token: &'a str,
    pub method: &'a str,
    pub url: &'a str,
}

#[derive(Debug, Clone)]
pub struct DpopVerifier {
    max_age_secs: i64,
    leeway_secs: i64,
}

impl DpopVerifier {
    #[must_use]
    pub fn new(cfg: &DpopConfig) -> Self {
        Self {
            max_age_secs: cfg.max_age_secs,
            leeway_secs: cfg.leeway_secs,
        }
    }

    /// Check a raw `DPoP` header value against the token binding.
    ///
    /// # Errors
    /// Returns the first [`DpopError`] found.
    pub fn verify(
        &self,
        proof: Option<&str>,
        binding: &ProofBinding<'_>,
        now: DateTime<Utc>,
    ) -> Result<(), DpopError> {
        let proof = proof.map(str::trim).filter(|p| !p.is_empty()).ok_or(DpopError::Missing)?;

        let header =
            jsonwebtoken::decode_header(proof).map_err(|e| DpopError::Malformed(e.to_string()))?;
        if !header
            .typ
            .as_deref()
            .is_some_and(|typ| typ.eq_ignore_ascii_case(PROOF_TYPE))
        {
            return Err(DpopError::WrongType);
        }
        if matches!(header.alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(DpopError::SymmetricAlgorithm);
        }
        let jwk = header.jwk.as_ref().ok_or(DpopError::MissingKey)?;
        if jwk_thumbprint(jwk)? != binding.jkt {
            return Err(DpopError::KeyMismatch);
        }

        let key = DecodingKey::from_jwk(jwk).map_err(|e| DpopError::Malformed(e.to_string()))?;
        let mut validation = Validation::new(header.alg);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();
        let claims = jsonwebtoken::decode::<ProofClaims>(proof, &key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => DpopError::InvalidSignature,
                _ => DpopError::Malformed(e.to_string()),
            })?
            .claims;

        if !claims.htm.eq_ignore_ascii_case(binding.method) {
            return Err(DpopError::MethodMismatch);
        }
        if strip_query(&claims.htu) != binding.url {
            return Err(DpopError::UrlMismatch);
        }
        if claims.ath.as_deref() != Some(access_token_hash(binding.access_token).as_str()) {
            return Err(DpopError::AccessTokenHashMismatch);
        }

        let age = now.timestamp().saturating_sub(claims.iat);
        if age > self.max_age_secs {
            return Err(DpopError::Stale);
        }
        if age.saturating_neg() > self.leeway_secs {
            return Err(DpopError::IssuedInFuture);
        }
        Ok(())
    }
}

/// RFC 7638 SHA-256 thumbprint, base64url without padding.
///
/// # Errors
/// Returns [`DpopError::Malformed`] for key types other than EC, RSA and OKP
/// or when a required member is absent.
pub fn jwk_thumbprint(jwk: &Jwk) -> Result<String, DpopError> {
    let value = serde_json::to_value(jwk).map_err(|e| DpopError::Malformed(e.to_string()))?;
    let kty = value
        .get("kty")
        .and_then(Value::as_str)
        .ok_or_else(|| DpopError::Malformed("jwk has no kty".to_owned()))?;
    let members: &[&str] = match kty {
        "EC" => &["crv", "kty", "x", "y"],
        "RSA" => &["e", "kty", "n"],
        "OKP" => &["crv", "kty", "x"],
        other => return Err(DpopError::Malformed(format!("unsupported jwk kty '{other}'"))),
    };

    let mut canonical = BTreeMap::new();
    for member in members {
        let v = value
            .get(*member)
            .ok_or_else(|| DpopError::Malformed(format!("jwk is missing '{member}'")))?;
        canonical.insert(*member, v);
    }
    let json = serde_json::to_string(&canonical).map_err(|e| DpopError::Malformed(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(Sha256::digest(json.as_bytes())))
}

/// `ath` claim value for an access token.
#[must_use]
pub fn access_token_hash(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}
