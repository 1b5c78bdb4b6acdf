#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static credential store plugin
//!
//! Keeps users, token secrets and browser sessions in memory, loaded from
//! configuration. Intended for development, demos and tests.
//!
//! ## Configuration
//!
//! ```yaml
//! credentials:
//!   users:
//!     - { id: 1, username: root, email: root@example.com, is_admin: true }
//!   tokens:
//!     - token: "root-pat"
//!       credential: { type: access_token, id: 1, user_id: 1, scopes: [api, sudo] }
//!   sessions:
//!     - { session_id: "abc123", user_id: 1 }
//! ```

pub mod config;
pub mod domain;

pub use config::StaticCredentialPluginConfig;
pub use domain::StaticCredentialStore;
