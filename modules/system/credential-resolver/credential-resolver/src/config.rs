//! Configuration for the credential resolver.

use serde::{Deserialize, Serialize};

/// Configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Accept impersonation tokens minted by administrators.
    pub impersonation_enabled: bool,

    /// Upper bound for the detached last-used update.
    pub touch_timeout_ms: u64,

    pub dpop: DpopConfig,

    pub language_server: LanguageServerConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            impersonation_enabled: true,
            touch_timeout_ms: 500,
            dpop: DpopConfig::default(),
            language_server: LanguageServerConfig::default(),
        }
    }
}

/// Freshness window for `DPoP` proofs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DpopConfig {
    /// How old a proof's `iat` may be.
    pub max_age_secs: i64,
    /// How far in the future a proof's `iat` may be.
    pub leeway_secs: i64,
}

impl Default for DpopConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 300,
            leeway_secs: 5,
        }
    }
}

/// Which language-server builds are refused on restricted routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LanguageServerConfig {
    pub enforce: bool,
    /// Product token in the `User-Agent` header.
    pub product: String,
    /// Oldest accepted `major.minor.patch`.
    pub minimum_version: String,
}

impl Default for LanguageServerConfig {
    fn default() -> Self {
        Self {
            enforce: true,
            product: "code-language-server".to_owned(),
            minimum_version: "7.17.1".to_owned(),
        }
    }
}
