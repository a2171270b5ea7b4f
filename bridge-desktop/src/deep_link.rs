//! In-process deep-link routing.
//!
//! The desktop shell receives custom-scheme URIs from the OS (single-instance
//! forwarding, `open-url` events) and pushes them into this router with
//! [`ChannelDeepLinkChannel::deliver`]. The auth core consumes them through
//! the [`DeepLinkChannel`] trait.

use async_trait::async_trait;
use bridge_traits::{
    deep_link::{DeepLinkChannel, DeepLinkReceiver},
    error::Result,
};
use core_async::sync::mpsc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

type Routes = HashMap<String, mpsc::UnboundedSender<String>>;

/// Cloneable router; every clone shares the same registrations.
#[derive(Clone, Default)]
pub struct ChannelDeepLinkChannel {
    routes: Arc<Mutex<Routes>>,
}

impl ChannelDeepLinkChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn routes(&self) -> MutexGuard<'_, Routes> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.routes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Forward a URI received from the OS.
    ///
    /// Returns `false` when nobody is listening for its scheme.
    pub fn deliver(&self, uri: &str) -> bool {
        let Some(scheme) = scheme_of(uri) else {
            warn!("Dropping deep link without a scheme");
            return false;
        };

        let mut routes = self.routes();

        let Some(sender) = routes.get(&scheme) else {
            debug!(scheme = %scheme, "No listener registered for deep link");
            return false;
        };

        if sender.send(uri.to_string()).is_err() {
            // Receiver dropped without unlisten.
            routes.remove(&scheme);
            return false;
        }
        true
    }

    /// Whether a listener is registered for `scheme`.
    pub fn is_listening(&self, scheme: &str) -> bool {
        self.routes().contains_key(&scheme.to_ascii_lowercase())
    }
}

fn scheme_of(uri: &str) -> Option<String> {
    url::Url::parse(uri)
        .ok()
        .map(|parsed| parsed.scheme().to_string())
}

#[async_trait]
impl DeepLinkChannel for ChannelDeepLinkChannel {
    async fn listen(&self, scheme: &str) -> Result<DeepLinkReceiver> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut routes = self.routes();
        routes.insert(scheme.to_ascii_lowercase(), tx);
        debug!(scheme, "Deep-link listener registered");
        Ok(rx)
    }

    async fn unlisten(&self, scheme: &str) -> Result<()> {
        let mut routes = self.routes();
        if routes.remove(&scheme.to_ascii_lowercase()).is_some() {
            debug!(scheme, "Deep-link listener removed");
        }
        Ok(())
    }
}
