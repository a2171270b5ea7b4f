//! Deep-Link Delivery
//!
//! The OS hands custom-scheme URIs (`clipify://auth/callback?...`) to the
//! running application. A [`DeepLinkChannel`] turns that delivery into an
//! ordered stream of raw URI strings.

use async_trait::async_trait;
use core_async::sync::mpsc;

use crate::error::Result;

/// Receiving end of a deep-link registration.
///
/// URIs arrive in the order the OS delivered them. The stream ends when the
/// registration is torn down with [`DeepLinkChannel::unlisten`].
pub type DeepLinkReceiver = mpsc::UnboundedReceiver<String>;

/// Custom URI scheme registration.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::deep_link::DeepLinkChannel;
///
/// async fn first_link(channel: &dyn DeepLinkChannel) -> Option<String> {
///     let mut rx = channel.listen("clipify").await.ok()?;
///     rx.recv().await
/// }
/// ```
#[async_trait]
pub trait DeepLinkChannel: Send + Sync {
    /// Register for URIs with the given scheme.
    ///
    /// Registering the same scheme again replaces the previous receiver.
    async fn listen(&self, scheme: &str) -> Result<DeepLinkReceiver>;

    /// Drop the registration for `scheme`. Safe to call when not registered.
    async fn unlisten(&self, scheme: &str) -> Result<()>;
}
