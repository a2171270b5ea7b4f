//! Notification sink for hosts without a native notification bridge.

use async_trait::async_trait;
use bridge_traits::{error::Result, notification::Notifier};
use tracing::{info, warn};

/// Records notifications as tracing events under the
/// `clipify::notification` target so the shell's log pipeline can surface
/// them.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn auth_success(&self, message: &str) -> Result<()> {
        info!(target: "clipify::notification", kind = "auth_success", "{}", message);
        Ok(())
    }

    async fn auth_error(&self, message: &str) -> Result<()> {
        warn!(target: "clipify::notification", kind = "auth_error", "{}", message);
        Ok(())
    }
}
