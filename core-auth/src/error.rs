use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Raw failures produced by the auth core before classification.
///
/// [`crate::classifier::classify`] maps these into the closed
/// [`ErrorKind`](crate::classifier::ErrorKind) taxonomy the UI sees.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Secure storage error: {0}")]
    Storage(String),

    #[error("Stored token is corrupted: {0}")]
    TokenCorrupted(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Deep link error: {0}")]
    DeepLink(String),

    #[error("OAuth error: {0}")]
    OAuthCallback(String),

    #[error("Invalid state parameter: callback does not match the pending request")]
    StateMismatch,

    #[error("Invalid state: no pending authentication request")]
    NoPendingRequest,

    #[error("Authorization code expired: callback arrived after {elapsed_secs}s")]
    RequestExpired { elapsed_secs: i64 },

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("No stored session to refresh")]
    NotSignedIn,

    #[error("Failed to open browser: {0}")]
    BrowserLaunch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl AuthError {
    /// HTTP status carried by the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<BridgeError> for AuthError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Network(msg) => AuthError::Network(msg),
            other => AuthError::Other(other.to_string()),
        }
    }
}

impl From<core_runtime::Error> for AuthError {
    fn from(err: core_runtime::Error) -> Self {
        AuthError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
