//! # Authentication Module
//!
//! OAuth 2.0 authorization-code flow and token lifecycle for the Clipify
//! desktop client.
//!
//! ## Overview
//!
//! The browser completes sign-in against the Clipify backend and the OS hands
//! the result back through a custom-scheme deep link. This crate correlates
//! that callback, exchanges the code for tokens, keeps them in the platform
//! secret store and refreshes them before they expire.
//!
//! ## Features
//!
//! - PKCE (S256) authorization URLs with a correlation nonce
//! - Deep-link callback correlation with a start/stop listener
//! - Token persistence via the `SecureStore` bridge
//! - Proactive refresh on a re-armed background task
//! - A closed error taxonomy with retry and display hints
//! - Session state published on a watch channel and the event bus

pub mod classifier;
pub mod deep_link;
pub mod error;
pub mod exchange;
pub mod manager;
pub mod pkce;
pub mod refresh;
pub mod token_store;
pub mod types;

#[cfg(test)]
mod test_support;

pub use classifier::{
    classify, classify_message, format_for_display, retry_strategy, ClassifiedError,
    DisplayAction, DisplayError, ErrorKind, RetryStrategy,
};
pub use deep_link::{parse_callback_uri, DeepLinkCorrelator, DeepLinkHandler};
pub use error::{AuthError, Result};
pub use exchange::{TokenExchange, TokenExchangeClient};
pub use manager::SessionManager;
pub use pkce::{build_auth_url, PkceVerifier};
pub use token_store::{TokenStore, TOKEN_STORAGE_KEY};
pub use types::{AuthCallback, AuthMode, PendingAuthRequest, SessionState, TokenRecord, User};
