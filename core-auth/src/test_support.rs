//! In-memory bridges shared by the unit tests.

use crate::types::{TokenRecord, User};
use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{BrowserLauncher, Clock, Notifier, SecureStore};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

pub fn user() -> User {
    User {
        id: "user-1".to_string(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        plan: "pro".to_string(),
    }
}

pub fn record(expires_at: i64, refresh_token: Option<&str>) -> TokenRecord {
    TokenRecord {
        access_token: format!("access-{}", expires_at),
        refresh_token: refresh_token.map(str::to_string),
        expires_at,
        user: user(),
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_all: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn put_raw(&self, key: &str, value: &[u8]) {
        self.data
            .lock()
            .await
            .insert(key.to_string(), value.to_vec());
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.data.lock().await.contains_key(key)
    }

    fn check(&self) -> BridgeResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(BridgeError::NotAvailable("keyring locked".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SecureStore for MemoryStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
        self.check()?;
        self.put_raw(key, value).await;
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
        self.check()?;
        Ok(self.data.lock().await.get(key).cloned())
    }

    async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
        self.check()?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("delete refused".to_string()));
        }
        self.data.lock().await.remove(key);
        Ok(())
    }
}

/// Clock pinned to a settable Unix timestamp.
pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn at(secs: i64) -> Self {
        Self(AtomicI64::new(secs))
    }

    pub fn set(&self, secs: i64) {
        self.0.store(secs, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.unix_timestamp(), 0).unwrap_or_default()
    }

    fn unix_timestamp(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct RecordingBrowser {
    pub urls: std::sync::Mutex<Vec<String>>,
}

impl RecordingBrowser {
    pub fn opened(&self) -> Vec<String> {
        self.urls.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl BrowserLauncher for RecordingBrowser {
    async fn open_url(&self, url: &str) -> BridgeResult<()> {
        if let Ok(mut urls) = self.urls.lock() {
            urls.push(url.to_string());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub successes: std::sync::Mutex<Vec<String>>,
    pub errors: std::sync::Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn auth_success(&self, message: &str) -> BridgeResult<()> {
        if let Ok(mut s) = self.successes.lock() {
            s.push(message.to_string());
        }
        Ok(())
    }

    async fn auth_error(&self, message: &str) -> BridgeResult<()> {
        if let Ok(mut e) = self.errors.lock() {
            e.push(message.to_string());
        }
        Ok(())
    }
}
