//! API Gateway
//!
//! The request gate every routed endpoint sits behind:
//!
//! 1. [`credentials`] picks the one credential a request carries
//! 2. the credential resolver turns it into a principal
//! 3. [`sudo`] optionally swaps in an impersonated user
//! 4. [`authorize`] checks scopes, granular permissions, roles and flags
//! 5. [`error`] converts any refusal into the final HTTP response
//!
//! Routes and their [`EndpointRequirement`]s are registered together through
//! [`GatewayBuilder`]; handlers read the outcome with the [`Authorized`]
//! extractor.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod auth;
pub mod authorize;
pub mod config;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod middleware;
pub mod registry;
pub mod requirement;
pub mod sudo;

pub use config::GatewayConfig;
pub use error::{GateRejection, error_response, not_found_response};
pub use extract::Authorized;
pub use gateway::{GatewayBuilder, serve};
pub use requirement::{Authentication, EndpointRequirement, ResourceSelector, RoleRequirement};
