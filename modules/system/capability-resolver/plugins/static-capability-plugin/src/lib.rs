#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static capability plugin
//!
//! Answers feature flag and access level questions from configuration.
//!
//! ## Access rules
//!
//! - Administrators hold `admin` on every configured resource and on the instance.
//! - Other authenticated callers hold `guest` on the instance.
//! - On groups and projects a user holds the highest of: their membership
//!   level, the level inherited from the project's group, and `guest` when
//!   the resource is public (or internal and the caller is a signed-in user).
//! - Job tokens act with the access of the user who started the job.
//! - Deploy tokens hold `reporter` on their own project and nothing else.
//! - Resources missing from the configuration are invisible.

pub mod config;
pub mod domain;

pub use config::StaticCapabilityPluginConfig;
pub use domain::StaticCapabilities;
