//! Credential Resolver SDK
//!
//! This crate provides the public API for the credential resolver:
//!
//! - [`CredentialClaim`] - the single credential extracted from a request
//! - [`CredentialResolverClient`] - API trait consumed by the gateway
//! - [`CredentialStore`] - lookup trait implemented by storage plugins
//! - [`StoredCredential`] and friends - what a store knows about a token
//! - [`StoreError`] - store failures
//!
//! ## Usage
//!
//! ```ignore
//! use credential_resolver_sdk::{CredentialResolverClient, ResolveRequest};
//!
//! let principal = resolver.resolve(&ResolveRequest::new(&claim)).await?;
//! ```

pub mod api;
pub mod claim;
pub mod error;
pub mod models;
pub mod store;

pub use api::{ClientFacts, CredentialResolverClient, ResolveRequest, RouteAuthSettings};
pub use claim::{ClaimKind, CredentialClaim};
pub use error::StoreError;
pub use models::{
    AccessTokenKind, AccessTokenRecord, DeployTokenRecord, JobTokenRecord, StoredCredential,
    TokenRef, UserLookup, UserRecord,
};
pub use store::CredentialStore;
