//! Language-server client restriction.
//!
//! Outdated language-server builds are refused on routes that opt in. The
//! client is recognized by a `<product>/<version>` token anywhere in its
//! `User-Agent` header.

use std::fmt;
use std::str::FromStr;

use crate::config::LanguageServerConfig;

/// `major.minor.patch`, ignoring pre-release and build suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClientVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid client version '{0}'")]
pub struct InvalidVersion(pub String);

impl FromStr for ClientVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let core = s.split(['-', '+']).next().unwrap_or_default();
        let mut parts = core.split('.');
        let mut next = |required: bool| -> Result<u64, InvalidVersion> {
            match parts.next() {
                Some(p) => p.parse().map_err(|_| InvalidVersion(s.to_owned())),
                None if required => Err(InvalidVersion(s.to_owned())),
                None => Ok(0),
            }
        };
        let version = Self {
            major: next(true)?,
            minor: next(false)?,
            patch: next(false)?,
        };
        if parts.next().is_some() {
            return Err(InvalidVersion(s.to_owned()));
        }
        Ok(version)
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Decides whether a `User-Agent` belongs to a refused client.
#[derive(Debug, Clone)]
pub struct LanguageServerPolicy {
    enforce: bool,
    product: String,
    minimum: ClientVersion,
}

impl LanguageServerPolicy {
    /// # Errors
    /// Returns [`InvalidVersion`] if `minimum_version` does not parse.
    pub fn new(cfg: &LanguageServerConfig) -> Result<Self, InvalidVersion> {
        Ok(Self {
            enforce: cfg.enforce,
            product: cfg.product.clone(),
            minimum: cfg.minimum_version.parse()?,
        })
    }

    /// Requests without the product token pass.
    ///
    /// # Errors
    /// Returns the refusal reason for outdated builds and for a product token
    /// with an unreadable version.
    pub fn check(&self, user_agent: Option<&str>) -> Result<(), String> {
        if !self.enforce {
            return Ok(());
        }
        let Some(raw) = user_agent.and_then(|ua| self.product_version(ua)) else {
            return Ok(());
        };
        match raw.parse::<ClientVersion>() {
            Ok(version) if version >= self.minimum => Ok(()),
            Ok(version) => Err(format!(
                "{} {version} is not supported, upgrade to {} or later",
                self.product, self.minimum
            )),
            Err(_) => Err(format!("{} version '{raw}' is not recognized", self.product)),
        }
    }

    fn product_version<'a>(&self, user_agent: &'a str) -> Option<&'a str> {
        user_agent.split_whitespace().find_map(|token| {
            let (name, version) = token.split_once('/')?;
            name.eq_ignore_ascii_case(&self.product).then_some(version)
        })
    }
}
