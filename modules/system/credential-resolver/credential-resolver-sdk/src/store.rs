//! Storage API implemented by credential plugins.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{StoredCredential, TokenRef, UserLookup, UserRecord};

/// Read-mostly lookups the resolver performs against persisted credentials.
///
/// Implementations must be safe to call concurrently from any number of
/// requests; the resolver never holds locks across these calls.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find the credential a raw token secret belongs to.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the store cannot answer.
    async fn find_token(&self, secret: &str) -> Result<Option<StoredCredential>, StoreError>;

    /// # Errors
    /// Returns [`StoreError`] when the store cannot answer.
    async fn find_user(&self, lookup: &UserLookup) -> Result<Option<UserRecord>, StoreError>;

    /// Find the user id a browser session belongs to.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the store cannot answer.
    async fn find_session(&self, session_id: &str) -> Result<Option<u64>, StoreError>;

    /// Record that a token was just used. Callers treat this as best-effort.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the write fails.
    async fn touch_last_used(&self, token: TokenRef) -> Result<(), StoreError>;
}
