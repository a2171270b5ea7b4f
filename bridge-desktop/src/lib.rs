//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `SecureStore` using the `keyring` crate
//! - `BrowserLauncher` using the `open` crate
//! - `DeepLinkChannel` as an in-process router the shell feeds with the
//!   URIs it receives from the OS
//! - `Notifier` that records notifications through `tracing`
//!
//! ## Feature Flags
//!
//! - `secure-store`: Enable OS keychain integration (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ChannelDeepLinkChannel, OpenBrowserLauncher, ReqwestHttpClient};
//!
//! let http_client = ReqwestHttpClient::new()?;
//! let deep_links = ChannelDeepLinkChannel::new();
//!
//! // Forward OS deliveries from the shell's single-instance handler:
//! deep_links.deliver("clipify://auth/callback?code=abc&state=xyz");
//! ```

mod browser;
mod deep_link;
mod http;
mod notification;

#[cfg(feature = "secure-store")]
mod secure_store;

pub use browser::OpenBrowserLauncher;
pub use deep_link::ChannelDeepLinkChannel;
pub use http::ReqwestHttpClient;
pub use notification::TracingNotifier;

#[cfg(feature = "secure-store")]
pub use secure_store::KeyringSecureStore;
