//! Credential Resolver
//!
//! Exchanges the credential claim extracted from a request for a concrete
//! principal: a user (session, personal, impersonation or OAuth token), a
//! deploy token or a CI job token.
//!
//! Lookups go through an injected [`credential_resolver_sdk::CredentialStore`].
//! The resolver itself keeps no per-request state; the only write it issues is
//! the best-effort last-used bump, which runs detached from the request.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::ResolverConfig;
pub use domain::{CredentialResolverLocalClient, Service};
