#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Security primitives shared by every gate component.
//!
//! - [`Principal`] - the identity resolved from a request's credentials
//! - [`AuthorizationContext`] - a principal plus an optional sudo override
//! - [`TokenScopes`] - coarse and granular token grants
//! - [`AccessLevel`] / [`ResourceRef`] - role requirements on resources
//! - [`AuthError`] / [`GateError`] - the closed failure taxonomy

pub mod access;
pub mod context;
pub mod error;
pub mod principal;
pub mod scopes;

pub use access::{AccessLevel, ResourceKind, ResourceRef};
pub use context::{AuthorizationContext, ImpersonationRefused};
pub use error::{AuthError, ErrorKind, GateError};
pub use principal::{
    AuthMethod, DeployTokenPrincipal, JobTokenPrincipal, Principal, UserIdentity, UserPrincipal,
};
pub use scopes::{TokenScopes, scope};
