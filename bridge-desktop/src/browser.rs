//! System browser launcher backed by the `open` crate.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    launcher::BrowserLauncher,
};
use tracing::{debug, warn};

/// Opens URLs with the platform handler (`open` on macOS, `xdg-open` on
/// Linux, `start` on Windows) without waiting for the browser to exit.
#[derive(Debug, Clone, Default)]
pub struct OpenBrowserLauncher;

impl OpenBrowserLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BrowserLauncher for OpenBrowserLauncher {
    async fn open_url(&self, url: &str) -> Result<()> {
        if url::Url::parse(url).is_err() {
            return Err(BridgeError::OperationFailed(format!(
                "Refusing to open malformed URL: {}",
                url
            )));
        }

        open::that_detached(url).map_err(|e| {
            warn!(error = %e, "Failed to launch system browser");
            BridgeError::NotAvailable(format!("Unable to open browser: {}", e))
        })?;

        debug!("Launched system browser");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_malformed_url() {
        let launcher = OpenBrowserLauncher::new();
        let err = launcher.open_url("not a url").await.unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }
}
