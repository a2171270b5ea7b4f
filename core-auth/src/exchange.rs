//! Token Exchange Client
//!
//! Talks to the Clipify backend token endpoints:
//!
//! | Operation | Endpoint | Body |
//! |-----------|----------|------|
//! | code → token | `POST /api/v1/auth/token` | `{code, codeVerifier, redirectUri}` |
//! | refresh → token | `POST /api/v1/auth/refresh` | `{refreshToken}` |
//! | validate | `POST /api/v1/auth/validate` | `{accessToken}` |
//!
//! Token responses share the [`TokenRecord`] shape. Every request is sent
//! exactly once: an authorization code is single-use, and refresh retries
//! are owned by the session manager.

use crate::error::{AuthError, Result};
use crate::types::TokenRecord;
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use core_runtime::config::AuthSettings;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const TOKEN_PATH: &str = "/api/v1/auth/token";
const REFRESH_PATH: &str = "/api/v1/auth/refresh";
const VALIDATE_PATH: &str = "/api/v1/auth/validate";

/// Token endpoint operations used by the session manager.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Swap a single-use authorization code for a token record.
    async fn exchange_code_for_token(&self, code: &str, code_verifier: &str)
        -> Result<TokenRecord>;

    /// Obtain a replacement record from a refresh token.
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenRecord>;

    /// Ask the backend whether an access token is still honoured.
    async fn validate_token(&self, access_token: &str) -> Result<bool>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CodeExchangeRequest<'a> {
    code: &'a str,
    code_verifier: &'a str,
    redirect_uri: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateRequest<'a> {
    access_token: &'a str,
}

#[derive(Deserialize)]
struct ValidateResponse {
    valid: bool,
}

/// HTTP implementation of [`TokenExchange`].
pub struct TokenExchangeClient {
    http_client: Arc<dyn HttpClient>,
    token_url: String,
    refresh_url: String,
    validate_url: String,
    redirect_uri: String,
}

impl TokenExchangeClient {
    pub fn new(settings: &AuthSettings, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            token_url: settings.api_endpoint(TOKEN_PATH),
            refresh_url: settings.api_endpoint(REFRESH_PATH),
            validate_url: settings.api_endpoint(VALIDATE_PATH),
            redirect_uri: settings.redirect_uri(),
        }
    }

    async fn post<T: Serialize>(&self, url: &str, body: &T) -> Result<HttpResponse> {
        let request = HttpRequest::new(HttpMethod::Post, url)
            .header("Accept", "application/json")
            .json(body)
            .map_err(|e| AuthError::Serialization(e.to_string()))?;

        let response = self
            .http_client
            .execute_with_retry(request, RetryPolicy::none())
            .await?;

        debug!(status = response.status, url, "Token endpoint responded");
        Ok(response)
    }

    fn reject(response: &HttpResponse, operation: &str) -> AuthError {
        let body = response
            .text()
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        warn!(status = response.status, operation, "Token endpoint rejected request");
        AuthError::Http {
            status: response.status,
            body,
        }
    }

    fn parse_record(response: &HttpResponse) -> Result<TokenRecord> {
        response
            .json::<TokenRecord>()
            .map_err(|e| AuthError::Serialization(format!("Malformed token response: {}", e)))
    }
}

#[async_trait]
impl TokenExchange for TokenExchangeClient {
    #[instrument(skip_all)]
    async fn exchange_code_for_token(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenRecord> {
        let body = CodeExchangeRequest {
            code,
            code_verifier,
            redirect_uri: &self.redirect_uri,
        };

        let response = self.post(&self.token_url, &body).await?;
        if !response.is_success() {
            return Err(Self::reject(&response, "exchange"));
        }

        let record = Self::parse_record(&response)?;
        info!(
            user_id = %record.user.id,
            expires_at = record.expires_at,
            "Exchanged authorization code for token"
        );
        Ok(record)
    }

    #[instrument(skip_all)]
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenRecord> {
        let response = self
            .post(&self.refresh_url, &RefreshRequest { refresh_token })
            .await?;
        if !response.is_success() {
            return Err(Self::reject(&response, "refresh"));
        }

        let record = Self::parse_record(&response)?;
        info!(
            expires_at = record.expires_at,
            has_refresh_token = record.refresh_token.is_some(),
            "Refreshed access token"
        );
        Ok(record)
    }

    #[instrument(skip_all)]
    async fn validate_token(&self, access_token: &str) -> Result<bool> {
        let response = self
            .post(&self.validate_url, &ValidateRequest { access_token })
            .await?;

        match response.status {
            401 | 403 => {
                debug!(status = response.status, "Access token rejected");
                Ok(false)
            }
            _ if response.is_success() => {
                let parsed: ValidateResponse = response.json().map_err(|e| {
                    AuthError::Serialization(format!("Malformed validation response: {}", e))
                })?;
                Ok(parsed.valid)
            }
            _ => Err(Self::reject(&response, "validate")),
        }
    }
}
