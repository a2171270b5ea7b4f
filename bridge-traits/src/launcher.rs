//! External browser launching.

use async_trait::async_trait;

use crate::error::Result;

/// Opens URLs in the user's default browser.
///
/// The authorization flow runs entirely in the external browser; the core
/// only needs to hand it the authorization URL.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn open_url(&self, url: &str) -> Result<()>;
}
