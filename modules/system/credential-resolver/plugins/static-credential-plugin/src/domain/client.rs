//! `CredentialStore` implementation for the static store.

use async_trait::async_trait;
use credential_resolver_sdk::{
    CredentialStore, StoreError, StoredCredential, TokenRef, UserLookup, UserRecord,
};

use super::service::StaticCredentialStore;

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn find_token(&self, secret: &str) -> Result<Option<StoredCredential>, StoreError> {
        Ok(self.token(secret))
    }

    async fn find_user(&self, lookup: &UserLookup) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.user(lookup))
    }

    async fn find_session(&self, session_id: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.session(session_id))
    }

    async fn touch_last_used(&self, token: TokenRef) -> Result<(), StoreError> {
        self.touch(token);
        Ok(())
    }
}
