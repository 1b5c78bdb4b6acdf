//! Capability Resolver SDK
//!
//! Read-only collaborators the gate consults after a principal is known:
//!
//! - [`FeatureFlags`] - runtime switches gating whole endpoints
//! - [`AccessDirectory`] - a principal's access level on a resource
//!
//! Both are queried per request. The gate keeps no flag or membership state
//! of its own.

pub mod api;

pub use api::{AccessDirectory, FeatureFlags};
