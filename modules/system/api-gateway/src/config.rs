use serde::{Deserialize, Serialize};

/// Gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    pub bind_addr: String,

    /// Externally visible base URL, e.g. `https://api.example.com`. Used to
    /// rebuild the request URL `DPoP` proofs are bound to. When unset the URL is
    /// derived from the `Host` header over plain http.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,

    /// Where credentials are looked for.
    pub carriers: CarrierNames,

    pub sudo: SudoConfig,

    pub defaults: Defaults,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_owned(),
            public_url: None,
            carriers: CarrierNames::default(),
            sudo: SudoConfig::default(),
            defaults: Defaults::default(),
        }
    }
}

/// Header, query parameter and cookie names carrying credentials.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CarrierNames {
    pub private_token_header: String,
    pub private_token_param: String,
    pub sudo_header: String,
    pub sudo_param: String,
    pub dpop_header: String,
    pub session_cookie: String,
}

impl Default for CarrierNames {
    fn default() -> Self {
        Self {
            private_token_header: "PRIVATE-TOKEN".to_owned(),
            private_token_param: "private_token".to_owned(),
            sudo_header: "Sudo".to_owned(),
            sudo_param: "sudo".to_owned(),
            dpop_header: "DPoP".to_owned(),
            session_cookie: "_guard_session".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SudoConfig {
    /// Scope an administrator's token needs to impersonate.
    pub required_scope: String,
}

impl Default for SudoConfig {
    fn default() -> Self {
        Self {
            required_scope: guard_security::scope::SUDO.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Defaults {
    /// Global request body size limit in bytes
    pub body_limit_bytes: usize,
    pub request_timeout_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            body_limit_bytes: 16 * 1024 * 1024,
            request_timeout_secs: 30,
        }
    }
}
