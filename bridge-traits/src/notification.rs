//! User notifications.

use async_trait::async_trait;

use crate::error::Result;

/// Fire-and-forget notifications shown by the host.
///
/// The core never waits on the user's reaction and treats delivery failures
/// as non-fatal.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Authentication completed (for example "Welcome back, Ada!")
    async fn auth_success(&self, message: &str) -> Result<()>;

    /// Authentication failed with a user-facing message
    async fn auth_error(&self, message: &str) -> Result<()>;
}
