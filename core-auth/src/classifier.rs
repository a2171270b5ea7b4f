//! # Error Classifier
//!
//! Maps raw [`AuthError`] values into the closed [`ErrorKind`] taxonomy the
//! UI renders, together with a static retry policy and display hints.
//!
//! Structured failures map directly. Everything else goes through the
//! message heuristics in [`classify_message`], checked in priority order:
//! network, state, token, code expiry, cancellation, storage, deep link,
//! OAuth, unknown.
//!
//! ```
//! use core_auth::classifier::{classify, retry_strategy, ErrorKind};
//! use core_auth::AuthError;
//!
//! let err = classify(&AuthError::Other("Request timeout".into()), None);
//! assert_eq!(err.kind, ErrorKind::Network);
//! assert!(err.retryable);
//! assert_eq!(retry_strategy(&err).max_retries, 3);
//! ```

use crate::error::AuthError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of failure kinds surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    InvalidState,
    ExpiredCode,
    UserCancelled,
    #[serde(rename = "STORAGE_ERROR")]
    Storage,
    TokenExpired,
    InvalidToken,
    #[serde(rename = "BACKEND_ERROR")]
    Backend,
    #[serde(rename = "DEEP_LINK_ERROR")]
    DeepLink,
    #[serde(rename = "OAUTH_ERROR")]
    OAuth,
    #[serde(rename = "UNKNOWN_ERROR")]
    Unknown,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 11] = [
        ErrorKind::Network,
        ErrorKind::InvalidState,
        ErrorKind::ExpiredCode,
        ErrorKind::UserCancelled,
        ErrorKind::Storage,
        ErrorKind::TokenExpired,
        ErrorKind::InvalidToken,
        ErrorKind::Backend,
        ErrorKind::DeepLink,
        ErrorKind::OAuth,
        ErrorKind::Unknown,
    ];

    /// Wire code, e.g. `NETWORK_ERROR`.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::InvalidState => "INVALID_STATE",
            ErrorKind::ExpiredCode => "EXPIRED_CODE",
            ErrorKind::UserCancelled => "USER_CANCELLED",
            ErrorKind::Storage => "STORAGE_ERROR",
            ErrorKind::TokenExpired => "TOKEN_EXPIRED",
            ErrorKind::InvalidToken => "INVALID_TOKEN",
            ErrorKind::Backend => "BACKEND_ERROR",
            ErrorKind::DeepLink => "DEEP_LINK_ERROR",
            ErrorKind::OAuth => "OAUTH_ERROR",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }

    fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again."
            }
            ErrorKind::InvalidState => {
                "The sign-in request could not be verified. Please sign in again."
            }
            ErrorKind::ExpiredCode => "The sign-in link has expired. Please sign in again.",
            ErrorKind::UserCancelled => "Sign-in was cancelled.",
            ErrorKind::Storage => {
                "Unable to access secure storage. Please check your system keychain."
            }
            ErrorKind::TokenExpired => "Your session has expired. Please sign in again.",
            ErrorKind::InvalidToken => "Your session is no longer valid. Please sign in again.",
            ErrorKind::Backend => "The server is having trouble. Please try again in a moment.",
            ErrorKind::DeepLink => {
                "Could not complete sign-in from the browser. Please try again."
            }
            ErrorKind::OAuth => "Sign-in was not completed. Please try again.",
            ErrorKind::Unknown => "Something went wrong. Please try again.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A failure after classification. This is what [`SessionState`](crate::SessionState)
/// carries and the UI renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    /// Technical message (for logs)
    pub message: String,
    /// Message suitable for end users
    pub user_message: String,
    /// Upstream code such as an HTTP status
    pub code: Option<String>,
    /// Operation context, e.g. `"login"`
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub retryable: bool,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            user_message: kind.user_message().to_string(),
            code: None,
            details: None,
            timestamp: Utc::now(),
            retryable: strategy_for(kind).should_retry,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Classify a raw failure. `context` names the operation that failed.
pub fn classify(error: &AuthError, context: Option<&str>) -> ClassifiedError {
    let message = error.to_string();
    let kind = match error {
        AuthError::Network(_) => ErrorKind::Network,
        AuthError::Storage(_) | AuthError::TokenCorrupted(_) => ErrorKind::Storage,
        AuthError::DeepLink(_) => ErrorKind::DeepLink,
        AuthError::OAuthCallback(_) => ErrorKind::OAuth,
        AuthError::StateMismatch | AuthError::NoPendingRequest => ErrorKind::InvalidState,
        AuthError::RequestExpired { .. } => ErrorKind::ExpiredCode,
        AuthError::NoRefreshToken => ErrorKind::TokenExpired,
        // Nothing to retry with; only a new sign-in helps.
        AuthError::NotSignedIn => ErrorKind::InvalidToken,
        // Undecodable response bodies come from the token endpoint.
        AuthError::Serialization(_) => ErrorKind::Backend,
        AuthError::Http { status, .. } if *status >= 500 => ErrorKind::Backend,
        AuthError::Http { status: 401 | 403, .. } => ErrorKind::InvalidToken,
        _ => kind_from_message(&message),
    };

    let mut classified = ClassifiedError::new(kind, message);
    if let Some(status) = error.status() {
        classified = classified.with_code(status.to_string());
    }
    if let Some(context) = context {
        classified = classified.with_details(context);
    }
    classified
}

/// Classify a bare message using the substring heuristics alone.
pub fn classify_message(message: &str, context: Option<&str>) -> ClassifiedError {
    classify(&AuthError::Other(message.to_string()), context)
}

fn kind_from_message(message: &str) -> ErrorKind {
    let msg = message.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| msg.contains(n));

    if has(&[
        "network",
        "timeout",
        "timed out",
        "connection",
        "fetch",
        "offline",
        "unreachable",
        "dns",
    ]) {
        ErrorKind::Network
    } else if has(&["state"]) {
        ErrorKind::InvalidState
    } else if msg.contains("token") {
        if has(&["expired", "refresh"]) {
            ErrorKind::TokenExpired
        } else {
            ErrorKind::InvalidToken
        }
    } else if has(&["unauthorized", "forbidden", "revoked"]) {
        ErrorKind::InvalidToken
    } else if msg.contains("code") && has(&["expired", "invalid_grant"]) {
        ErrorKind::ExpiredCode
    } else if has(&["cancel", "closed by user", "user closed"]) {
        ErrorKind::UserCancelled
    } else if has(&["storage", "keyring", "keychain", "credential", "secret"]) {
        ErrorKind::Storage
    } else if has(&["deep link", "deep-link", "deeplink", "callback", "uri"]) {
        ErrorKind::DeepLink
    } else if has(&["oauth", "access_denied", "authorization", "consent"]) {
        ErrorKind::OAuth
    } else {
        ErrorKind::Unknown
    }
}

/// How a caller may retry after a classified failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryStrategy {
    pub should_retry: bool,
    pub delay_ms: u64,
    pub max_retries: u32,
}

pub fn retry_strategy(error: &ClassifiedError) -> RetryStrategy {
    strategy_for(error.kind)
}

fn strategy_for(kind: ErrorKind) -> RetryStrategy {
    let (should_retry, delay_ms, max_retries) = match kind {
        ErrorKind::Network => (true, 1000, 3),
        ErrorKind::Backend => (true, 2000, 2),
        ErrorKind::TokenExpired => (true, 0, 1),
        ErrorKind::Unknown => (true, 1000, 1),
        _ => (false, 0, 0),
    };
    RetryStrategy {
        should_retry,
        delay_ms,
        max_retries,
    }
}

/// Action the UI may offer next to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayAction {
    Retry,
    Login,
    Dismiss,
    CheckConnection,
    ContactSupport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayError {
    pub title: String,
    pub message: String,
    pub actions: Vec<DisplayAction>,
}

pub fn format_for_display(error: &ClassifiedError) -> DisplayError {
    use DisplayAction::*;

    let (title, actions) = match error.kind {
        ErrorKind::Network => ("Connection Problem", vec![Retry, CheckConnection]),
        ErrorKind::InvalidState => ("Sign-in Verification Failed", vec![Login, Dismiss]),
        ErrorKind::ExpiredCode => ("Sign-in Link Expired", vec![Login, Dismiss]),
        ErrorKind::UserCancelled => ("Sign-in Cancelled", vec![Login, Dismiss]),
        ErrorKind::Storage => ("Secure Storage Error", vec![ContactSupport, Dismiss]),
        ErrorKind::TokenExpired => ("Session Expired", vec![Login]),
        ErrorKind::InvalidToken => ("Session Invalid", vec![Login]),
        ErrorKind::Backend => ("Server Error", vec![Retry, Dismiss]),
        ErrorKind::DeepLink => ("Sign-in Link Error", vec![Login, Dismiss]),
        ErrorKind::OAuth => ("Sign-in Failed", vec![Login, Dismiss]),
        ErrorKind::Unknown => ("Unexpected Error", vec![Retry, ContactSupport]),
    };

    DisplayError {
        title: title.to_string(),
        message: error.user_message.clone(),
        actions,
    }
}
