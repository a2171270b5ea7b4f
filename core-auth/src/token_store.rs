//! Secure Token Storage
//!
//! Persists the single [`TokenRecord`] in the platform secret store.
//!
//! ## Security Features
//!
//! - Token values are never logged
//! - A blob that fails to deserialize is deleted and reported as corruption
//! - Expiry is read from an injected [`Clock`], never from wall time directly
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::TokenStore;
//! use bridge_traits::SystemClock;
//! use std::sync::Arc;
//! # use bridge_traits::storage::SecureStore;
//! # async fn example(secure_store: Arc<dyn SecureStore>) -> core_auth::Result<()> {
//! let token_store = TokenStore::new(secure_store, Arc::new(SystemClock));
//!
//! if let Some(record) = token_store.retrieve().await? {
//!     if token_store.is_expired(&record) {
//!         token_store.remove().await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::TokenRecord;
use bridge_traits::{Clock, SecureStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Secret-store key the record lives under.
pub const TOKEN_STORAGE_KEY: &str = "auth_token";

/// Secure storage for the current token record.
#[derive(Clone)]
pub struct TokenStore {
    secure_store: Arc<dyn SecureStore>,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    pub fn new(secure_store: Arc<dyn SecureStore>, clock: Arc<dyn Clock>) -> Self {
        debug!("Initializing TokenStore");
        Self {
            secure_store,
            clock,
        }
    }

    /// Load the stored record.
    ///
    /// Returns `Ok(None)` when nothing is stored. Corrupted data is deleted
    /// and reported as [`AuthError::TokenCorrupted`].
    pub async fn retrieve(&self) -> Result<Option<TokenRecord>> {
        let data = self
            .secure_store
            .get_secret(TOKEN_STORAGE_KEY)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to read token from secure storage");
                AuthError::Storage(e.to_string())
            })?;

        let Some(data) = data else {
            debug!("No token found in storage");
            return Ok(None);
        };

        match serde_json::from_slice::<TokenRecord>(&data) {
            Ok(record) => {
                debug!(
                    has_refresh_token = record.refresh_token.is_some(),
                    expires_at = record.expires_at,
                    "Token retrieved"
                );
                Ok(Some(record))
            }
            Err(e) => {
                warn!(error = %e, "Stored token is corrupted, deleting it");
                if let Err(delete_err) = self.secure_store.delete_secret(TOKEN_STORAGE_KEY).await {
                    warn!(error = %delete_err, "Failed to delete corrupted token data");
                }
                Err(AuthError::TokenCorrupted(e.to_string()))
            }
        }
    }

    /// Persist `record`, overwriting any previous one.
    pub async fn store(&self, record: &TokenRecord) -> Result<()> {
        let json = serde_json::to_vec(record).map_err(|e| {
            warn!(error = %e, "Failed to serialize token");
            AuthError::Serialization(e.to_string())
        })?;

        self.secure_store
            .set_secret(TOKEN_STORAGE_KEY, &json)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to write token to secure storage");
                AuthError::Storage(e.to_string())
            })?;

        info!(
            user_id = %record.user.id,
            has_refresh_token = record.refresh_token.is_some(),
            expires_at = record.expires_at,
            "Token stored"
        );
        Ok(())
    }

    /// Delete the record. Succeeds when nothing is stored.
    pub async fn remove(&self) -> Result<()> {
        self.secure_store
            .delete_secret(TOKEN_STORAGE_KEY)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to delete token from secure storage");
                AuthError::Storage(e.to_string())
            })?;

        info!("Token removed");
        Ok(())
    }

    /// Current time in the token's frame (Unix seconds).
    pub fn now_seconds(&self) -> i64 {
        self.clock.unix_timestamp()
    }

    /// `now >= expires_at`.
    pub fn is_expired(&self, record: &TokenRecord) -> bool {
        record.is_expired_at(self.now_seconds())
    }

    pub async fn has_valid_access_token(&self) -> Result<bool> {
        Ok(self
            .retrieve()
            .await?
            .is_some_and(|record| !self.is_expired(&record)))
    }

    pub async fn has_refresh_token(&self) -> Result<bool> {
        Ok(self
            .retrieve()
            .await?
            .is_some_and(|record| record.can_refresh()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{record, FixedClock, MemoryStore};

    fn store_at(now: i64) -> (TokenStore, MemoryStore, Arc<FixedClock>) {
        let secure_store = MemoryStore::new();
        let clock = Arc::new(FixedClock::at(now));
        let token_store = TokenStore::new(Arc::new(secure_store.clone()), clock.clone());
        (token_store, secure_store, clock)
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let (token_store, _, _) = store_at(1_000);
        let stored = record(5_000, Some("refresh_1"));

        token_store.store(&stored).await.unwrap();
        let retrieved = token_store.retrieve().await.unwrap().unwrap();

        assert_eq!(retrieved, stored);
    }

    #[tokio::test]
    async fn test_retrieve_missing_returns_none() {
        let (token_store, _, _) = store_at(1_000);
        assert!(token_store.retrieve().await.unwrap().is_none());
        assert!(!token_store.has_valid_access_token().await.unwrap());
        assert!(!token_store.has_refresh_token().await.unwrap());
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let (token_store, _, _) = store_at(1_000);
        token_store
            .store(&record(5_000, Some("old")))
            .await
            .unwrap();
        token_store.store(&record(9_000, None)).await.unwrap();

        let retrieved = token_store.retrieve().await.unwrap().unwrap();
        assert_eq!(retrieved.expires_at, 9_000);
        assert!(retrieved.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (token_store, secure_store, _) = store_at(1_000);
        token_store.store(&record(5_000, None)).await.unwrap();

        token_store.remove().await.unwrap();
        token_store.remove().await.unwrap();

        assert!(!secure_store.contains(TOKEN_STORAGE_KEY).await);
    }

    #[tokio::test]
    async fn test_corrupted_data_is_deleted() {
        let (token_store, secure_store, _) = store_at(1_000);
        secure_store.put_raw(TOKEN_STORAGE_KEY, b"{not json").await;

        let result = token_store.retrieve().await;
        assert!(matches!(result, Err(AuthError::TokenCorrupted(_))));
        assert!(!secure_store.contains(TOKEN_STORAGE_KEY).await);

        // Next read sees nothing rather than the same corruption.
        assert!(token_store.retrieve().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_storage_failures_are_storage_errors() {
        let (token_store, secure_store, _) = store_at(1_000);
        secure_store.fail_all(true);

        assert!(matches!(
            token_store.store(&record(5_000, None)).await,
            Err(AuthError::Storage(_))
        ));
        assert!(matches!(
            token_store.retrieve().await,
            Err(AuthError::Storage(_))
        ));
        assert!(matches!(
            token_store.remove().await,
            Err(AuthError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_is_expired_matches_clock() {
        let (token_store, _, clock) = store_at(1_000);
        let rec = record(1_000, None);

        for now in [0, 999, 1_000, 1_001, i64::MAX] {
            clock.set(now);
            assert_eq!(token_store.is_expired(&rec), now >= rec.expires_at);
        }
    }

    #[tokio::test]
    async fn test_predicates() {
        let (token_store, _, clock) = store_at(1_000);
        token_store
            .store(&record(2_000, Some("refresh_1")))
            .await
            .unwrap();

        assert!(token_store.has_valid_access_token().await.unwrap());
        assert!(token_store.has_refresh_token().await.unwrap());

        clock.set(2_000);
        assert!(!token_store.has_valid_access_token().await.unwrap());
        assert!(token_store.has_refresh_token().await.unwrap());
    }
}
