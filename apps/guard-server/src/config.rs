//! Layered server configuration: defaults, then a YAML file, then
//! `GUARD__`-prefixed environment variables (`__` separates sections, e.g.
//! `GUARD__GATEWAY__BIND_ADDR`).

use std::path::Path;

use anyhow::{Context, Result, bail};
use api_gateway::GatewayConfig;
use credential_resolver::ResolverConfig;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;
use serde_json::json;
use static_capability_plugin::StaticCapabilityPluginConfig;
use static_credential_plugin::StaticCredentialPluginConfig;

pub const ENV_PREFIX: &str = "GUARD__";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub resolver: ResolverConfig,
    /// Users, tokens and sessions for the in-memory credential store.
    pub credentials: StaticCredentialPluginConfig,
    /// Feature flags, resources and memberships.
    pub capabilities: StaticCapabilityPluginConfig,
}

/// Load the configuration. A path that was given must exist.
///
/// # Errors
/// Returns an error for a missing file or a configuration that does not
/// deserialize.
pub fn load(path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::new();
    if let Some(path) = path {
        if !path.is_file() {
            bail!("config file {} does not exist", path.display());
        }
        figment = figment.merge(Yaml::file(path));
    }
    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("invalid configuration")
}

/// Effective configuration for `--print-config`. Credential material is
/// summarised, never printed.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render(cfg: &AppConfig) -> Result<String> {
    let view = json!({
        "gateway": cfg.gateway,
        "resolver": cfg.resolver,
        "credentials": {
            "users": cfg.credentials.users.len(),
            "tokens": cfg.credentials.tokens.len(),
            "sessions": cfg.credentials.sessions.len(),
        },
        "capabilities": {
            "flags": cfg.capabilities.flags.len(),
            "resources": cfg.capabilities.resources.len(),
            "memberships": cfg.capabilities.memberships.len(),
        },
    });
    Ok(serde_json::to_string_pretty(&view)?)
}
