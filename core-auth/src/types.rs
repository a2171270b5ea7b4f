use crate::classifier::ClassifiedError;
use crate::pkce::PkceVerifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The signed-in account as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Subscription plan, e.g. `"free"` or `"pro"`
    #[serde(default)]
    pub plan: String,
}

/// The persisted credential set.
///
/// Serialized as camelCase JSON, which is also the shape of the token
/// endpoint responses.
///
/// # Security
///
/// `Debug` never prints token values:
///
/// ```
/// use core_auth::{TokenRecord, User};
///
/// let record = TokenRecord {
///     access_token: "secret_access".to_string(),
///     refresh_token: Some("secret_refresh".to_string()),
///     expires_at: 1_700_000_000,
///     user: User {
///         id: "u1".to_string(),
///         name: "Ada".to_string(),
///         email: "ada@example.com".to_string(),
///         plan: "free".to_string(),
///     },
/// };
///
/// let debug = format!("{:?}", record);
/// assert!(!debug.contains("secret_access"));
/// assert!(!debug.contains("secret_refresh"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Access-token expiry, Unix epoch seconds
    pub expires_at: i64,
    pub user: User,
}

impl TokenRecord {
    /// True when `now >= expires_at`. No skew is applied.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// True when the token expires within `horizon_secs` of `now`.
    pub fn expires_within(&self, now: i64, horizon_secs: i64) -> bool {
        now.saturating_add(horizon_secs) >= self.expires_at
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("user_id", &self.user.id)
            .finish()
    }
}

/// UI-facing session snapshot.
///
/// `is_authenticated` implies `user.is_some()`. Snapshots are always
/// published whole.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub user: Option<User>,
    pub error: Option<ClassifiedError>,
}

impl SessionState {
    /// State before `check_existing_auth` resolves.
    pub fn initializing() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    pub fn authenticated(user: User) -> Self {
        Self {
            is_authenticated: true,
            is_loading: false,
            user: Some(user),
            error: None,
        }
    }

    pub fn unauthenticated() -> Self {
        Self::default()
    }

    pub fn failed(error: ClassifiedError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Which browser flow to launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Login,
    Signup,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Login => "login",
            AuthMode::Signup => "signup",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An armed login/signup waiting for its callback.
#[derive(Debug, Clone)]
pub struct PendingAuthRequest {
    pub pkce: PkceVerifier,
    pub created_at: DateTime<Utc>,
    pub mode: AuthMode,
}

impl PendingAuthRequest {
    pub fn new(mode: AuthMode, created_at: DateTime<Utc>) -> Self {
        Self {
            pkce: PkceVerifier::new(),
            created_at,
            mode,
        }
    }

    /// Correlation nonce sent as the `state` parameter.
    pub fn state(&self) -> &str {
        self.pkce.state()
    }

    /// Seconds since the request was armed.
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_seconds()
    }
}

/// Parameters extracted from a successful callback URI.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthCallback {
    pub code: String,
    pub state: Option<String>,
}

impl fmt::Debug for AuthCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCallback")
            .field("code", &"[REDACTED]")
            .field("state", &self.state.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
