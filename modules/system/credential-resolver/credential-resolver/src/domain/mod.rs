//! Domain layer for the credential resolver.

pub mod client_version;
pub mod dpop;
pub mod local_client;
pub mod service;

pub use local_client::CredentialResolverLocalClient;
pub use service::Service;
