//! Unauthenticated credential claims.

use secrecy::{ExposeSecret, SecretString};

/// The one credential a request is authenticated with.
///
/// Built once per request by the credential extractor. Holds secrets, so `Debug`
/// output is redacted.
#[derive(Debug, Clone, Default)]
pub enum CredentialClaim {
    PrivateTokenHeader(SecretString),
    PrivateTokenParam(SecretString),
    /// `Authorization: Bearer`; may be an OAuth, personal, job or deploy token.
    BearerToken(SecretString),
    BasicAuth {
        username: String,
        password: SecretString,
    },
    SessionCookie(SecretString),
    #[default]
    None,
}

/// Secret-free discriminant of a [`CredentialClaim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimKind {
    PrivateTokenHeader,
    PrivateTokenParam,
    BearerToken,
    BasicAuth,
    SessionCookie,
    None,
}

impl CredentialClaim {
    #[must_use]
    pub fn kind(&self) -> ClaimKind {
        match self {
            Self::PrivateTokenHeader(_) => ClaimKind::PrivateTokenHeader,
            Self::PrivateTokenParam(_) => ClaimKind::PrivateTokenParam,
            Self::BearerToken(_) => ClaimKind::BearerToken,
            Self::BasicAuth { .. } => ClaimKind::BasicAuth,
            Self::SessionCookie(_) => ClaimKind::SessionCookie,
            Self::None => ClaimKind::None,
        }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// The raw secret carried by the claim, if any.
    #[must_use]
    pub fn secret(&self) -> Option<&str> {
        match self {
            Self::PrivateTokenHeader(s)
            | Self::PrivateTokenParam(s)
            | Self::BearerToken(s)
            | Self::SessionCookie(s) => Some(s.expose_secret()),
            Self::BasicAuth { password, .. } => Some(password.expose_secret()),
            Self::None => None,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secrets() {
        let claim = CredentialClaim::BearerToken(SecretString::from("glpat-secret".to_owned()));
        let rendered = format!("{claim:?}");
        assert!(!rendered.contains("glpat-secret"));
        assert_eq!(claim.kind(), ClaimKind::BearerToken);
        assert_eq!(claim.secret(), Some("glpat-secret"));
    }

    #[test]
    fn basic_auth_secret_is_the_password() {
        let claim = CredentialClaim::BasicAuth {
            username: "deployer".to_owned(),
            password: SecretString::from("dt-token".to_owned()),
        };
        assert_eq!(claim.secret(), Some("dt-token"));
    }

    #[test]
    fn default_is_none() {
        let claim = CredentialClaim::default();
        assert!(claim.is_none());
        assert_eq!(claim.secret(), None);
    }
}
