//! # Host Bridge Traits
//!
//! Capabilities the authentication core needs from the desktop host.
//!
//! ## Overview
//!
//! The core never talks to the OS directly. Every side effect (secret storage,
//! HTTP, opening the browser, receiving deep links, showing notifications,
//! reading the clock) goes through one of the traits below so that the core
//! can be driven by in-memory fakes in tests and by platform adapters in
//! production.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP with an optional retry policy
//!
//! ### Security & Storage
//! - [`SecureStore`](storage::SecureStore) - Credential persistence (Keychain/Credential Manager/Secret Service)
//!
//! ### OS Integration
//! - [`DeepLinkChannel`](deep_link::DeepLinkChannel) - Custom URI scheme delivery
//! - [`BrowserLauncher`](launcher::BrowserLauncher) - Open URLs in the system browser
//! - [`Notifier`](notification::Notifier) - Fire-and-forget user notifications
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Adapters should
//! report transport failures as [`BridgeError::Network`] so the core can tell
//! them apart from host failures.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared as
//! `Arc<dyn Trait>` across async tasks.

pub mod deep_link;
pub mod error;
pub mod http;
pub mod launcher;
pub mod notification;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use deep_link::DeepLinkChannel;
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use launcher::BrowserLauncher;
pub use notification::Notifier;
pub use storage::SecureStore;
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
