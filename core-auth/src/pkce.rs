//! PKCE (RFC 7636) verifier and authorization URL construction.
//!
//! The verifier never leaves the process; only its S256 challenge is put on
//! the authorization URL. The random `state` doubles as the correlation
//! nonce matched against the deep-link callback.

use crate::error::{AuthError, Result};
use crate::types::{AuthMode, PendingAuthRequest};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use core_runtime::config::AuthSettings;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::debug;
use url::Url;

/// Code verifier plus correlation state for one browser flow.
#[derive(Clone)]
pub struct PkceVerifier {
    verifier: String,
    state: String,
}

impl PkceVerifier {
    /// Generates a 32-byte verifier and a 16-byte state, both
    /// base64url-encoded without padding.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();

        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);

        Self {
            verifier: URL_SAFE_NO_PAD.encode(verifier_bytes),
            state: URL_SAFE_NO_PAD.encode(state_bytes),
        }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// `BASE64URL(SHA256(verifier))`
    pub fn challenge(&self) -> String {
        let hash = Sha256::digest(self.verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hash)
    }
}

impl Default for PkceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PkceVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkceVerifier")
            .field("verifier", &"[REDACTED]")
            .field("state", &"[REDACTED]")
            .finish()
    }
}

/// Builds the page the browser is sent to for `request`.
///
/// Appends `state`, `code_challenge`, `code_challenge_method=S256` and
/// `redirect_uri` to `oauth_base_url`, plus `signup=true` for signups.
pub fn build_auth_url(settings: &AuthSettings, request: &PendingAuthRequest) -> Result<String> {
    let mut url = Url::parse(&settings.oauth_base_url)
        .map_err(|e| AuthError::Config(format!("Invalid OAuth URL: {}", e)))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("state", request.state());
        query.append_pair("code_challenge", &request.pkce.challenge());
        query.append_pair("code_challenge_method", "S256");
        query.append_pair("redirect_uri", &settings.redirect_uri());
        if request.mode == AuthMode::Signup {
            query.append_pair("signup", "true");
        }
    }

    debug!(mode = %request.mode, "Built authorization URL");
    Ok(url.to_string())
}
