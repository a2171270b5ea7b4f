//! # Core Configuration Module
//!
//! Builds the [`CoreConfig`] the auth core is constructed from: the host
//! bridges plus the [`AuthSettings`] that drive the OAuth flow.
//!
//! ## Required Dependencies
//!
//! - `SecureStore` - token persistence (desktop default: keyring)
//! - `HttpClient` - token endpoint access (desktop default: reqwest)
//! - `BrowserLauncher` - opens the authorization page (desktop default: `open`)
//! - `DeepLinkChannel` - callback delivery; always injected by the host, since
//!   only the host sees OS deliveries
//!
//! ## Optional Dependencies
//!
//! - `Notifier` - user notifications (desktop default: tracing)
//! - `Clock` - defaults to [`SystemClock`]
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, EnvironmentConfig};
//! use bridge_desktop::ChannelDeepLinkChannel;
//! use std::sync::Arc;
//!
//! let deep_links = ChannelDeepLinkChannel::new();
//! let config = CoreConfig::builder()
//!     .deep_link_channel(Arc::new(deep_links.clone()))
//!     .auth_settings(EnvironmentConfig::from_env().into())
//!     .build()?;
//! ```
//!
//! Missing capabilities fail fast with [`Error::CapabilityMissing`]:
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - no deep-link channel");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    BrowserLauncher, Clock, DeepLinkChannel, HttpClient, Notifier, SecureStore, SystemClock,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Deployment environment selected by `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
        }
    }
}

/// Endpoints resolved from the process environment.
///
/// Mirrors the variables the desktop shell is built with:
///
/// | Variable | Production default | Development default |
/// |----------|--------------------|---------------------|
/// | `VITE_*_API_BASE_URL` | `https://clipify.space` | `http://localhost:8080` |
/// | `VITE_*_OAUTH_BASE_URL` | `https://clipify.space/api/v1/auth/google/login` | `http://localhost:8080/api/v1/auth/google/login` |
/// | `VITE_*_BASE_URL` | `https://clipify.space/` | `http://localhost:1420` |
///
/// where `*` is `PROD` when `NODE_ENV=production` and `DEV` otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    pub environment: Environment,
    pub api_base_url: String,
    pub oauth_base_url: String,
    pub app_base_url: String,
    pub deep_link_scheme: String,
}

impl EnvironmentConfig {
    /// Resolve from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("NODE_ENV")
            .map(|value| Environment::parse(&value))
            .unwrap_or(Environment::Development);

        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let (api_base_url, oauth_base_url, app_base_url) = match environment {
            Environment::Production => (
                var("VITE_PROD_API_BASE_URL", "https://clipify.space"),
                var(
                    "VITE_PROD_OAUTH_BASE_URL",
                    "https://clipify.space/api/v1/auth/google/login",
                ),
                var("VITE_PROD_BASE_URL", "https://clipify.space/"),
            ),
            Environment::Development => (
                var("VITE_DEV_API_BASE_URL", "http://localhost:8080"),
                var(
                    "VITE_DEV_OAUTH_BASE_URL",
                    "http://localhost:8080/api/v1/auth/google/login",
                ),
                var("VITE_DEV_BASE_URL", "http://localhost:1420"),
            ),
        };

        Self {
            environment,
            api_base_url,
            oauth_base_url,
            app_base_url,
            deep_link_scheme: var("CLIPIFY_DEEP_LINK_SCHEME", DEFAULT_DEEP_LINK_SCHEME),
        }
    }
}

/// Default custom URI scheme registered for callbacks.
pub const DEFAULT_DEEP_LINK_SCHEME: &str = "clipify";

/// Settings for the OAuth flow and the proactive refresh task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub environment: Environment,
    /// Backend origin hosting `/api/v1/auth/*`
    pub api_base_url: String,
    /// Authorization page opened in the browser
    pub oauth_base_url: String,
    /// Web front-end origin (used for links in notifications)
    pub app_base_url: String,
    /// Custom URI scheme the OS routes callbacks through
    pub deep_link_scheme: String,
    /// How often the refresh task inspects the stored token
    pub refresh_check_interval: Duration,
    /// Refresh when the token expires within this window
    pub refresh_horizon: Duration,
    /// Consecutive proactive refresh failures before forcing logout
    pub max_refresh_failures: u32,
    /// How long an armed login/signup waits for its callback
    pub pending_request_ttl: Duration,
}

impl Default for AuthSettings {
    fn default() -> Self {
        EnvironmentConfig::from_lookup(|key| {
            (key == "NODE_ENV").then(|| Environment::Production.as_str().to_string())
        })
        .into()
    }
}

impl From<EnvironmentConfig> for AuthSettings {
    fn from(env: EnvironmentConfig) -> Self {
        Self {
            environment: env.environment,
            api_base_url: env.api_base_url,
            oauth_base_url: env.oauth_base_url,
            app_base_url: env.app_base_url,
            deep_link_scheme: env.deep_link_scheme,
            refresh_check_interval: Duration::from_secs(60),
            refresh_horizon: Duration::from_secs(5 * 60),
            max_refresh_failures: 3,
            pending_request_ttl: Duration::from_secs(10 * 60),
        }
    }
}

impl AuthSettings {
    /// Redirect target registered with the backend, e.g. `clipify://auth/callback`.
    pub fn redirect_uri(&self) -> String {
        format!("{}://auth/callback", self.deep_link_scheme)
    }

    /// Backend endpoint under `api_base_url`, tolerating a trailing slash.
    pub fn api_endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn validate(&self) -> Result<()> {
        let scheme = &self.deep_link_scheme;
        let valid_scheme = scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !valid_scheme {
            return Err(Error::invalid(
                "deep_link_scheme",
                format!("'{}' is not a valid URI scheme", scheme),
            ));
        }

        for (field, value) in [
            ("api_base_url", &self.api_base_url),
            ("oauth_base_url", &self.oauth_base_url),
        ] {
            let url = Url::parse(value)
                .map_err(|e| Error::invalid(field, format!("'{}': {}", value, e)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::invalid(field, "must be an http(s) URL"));
            }
        }

        if self.refresh_check_interval.is_zero() {
            return Err(Error::invalid("refresh_check_interval", "must be non-zero"));
        }
        if self.refresh_horizon.is_zero() {
            return Err(Error::invalid("refresh_horizon", "must be non-zero"));
        }
        if self.max_refresh_failures == 0 {
            return Err(Error::invalid("max_refresh_failures", "must be at least 1"));
        }
        if self.pending_request_ttl.is_zero() {
            return Err(Error::invalid("pending_request_ttl", "must be non-zero"));
        }

        Ok(())
    }
}

/// Core configuration: bridges plus auth settings.
#[derive(Clone)]
pub struct CoreConfig {
    pub secure_store: Arc<dyn SecureStore>,
    pub http_client: Arc<dyn HttpClient>,
    pub deep_link_channel: Arc<dyn DeepLinkChannel>,
    pub browser_launcher: Arc<dyn BrowserLauncher>,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub clock: Arc<dyn Clock>,
    pub auth: AuthSettings,
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("secure_store", &"SecureStore { ... }")
            .field("http_client", &"HttpClient { ... }")
            .field("deep_link_channel", &"DeepLinkChannel { ... }")
            .field("browser_launcher", &"BrowserLauncher { ... }")
            .field("notifier", &self.notifier.as_ref().map(|_| "Notifier { ... }"))
            .field("auth", &self.auth)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

fn missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
mod defaults {
    use super::*;
    use bridge_desktop::{KeyringSecureStore, OpenBrowserLauncher, ReqwestHttpClient, TracingNotifier};

    pub fn secure_store() -> Result<Arc<dyn SecureStore>> {
        Ok(Arc::new(KeyringSecureStore::new()))
    }

    pub fn http_client() -> Result<Arc<dyn HttpClient>> {
        let client = ReqwestHttpClient::new().map_err(|e| {
            missing(
                "HttpClient",
                &format!("Default reqwest client could not be created: {}", e),
            )
        })?;
        Ok(Arc::new(client))
    }

    pub fn browser_launcher() -> Result<Arc<dyn BrowserLauncher>> {
        Ok(Arc::new(OpenBrowserLauncher::new()))
    }

    pub fn notifier() -> Option<Arc<dyn Notifier>> {
        Some(Arc::new(TracingNotifier::new()))
    }
}

#[cfg(not(feature = "desktop-shims"))]
mod defaults {
    use super::*;

    pub fn secure_store() -> Result<Arc<dyn SecureStore>> {
        Err(missing(
            "SecureStore",
            "A SecureStore is required to persist tokens. \
             Desktop: enable the 'desktop-shims' feature to use the keyring store.",
        ))
    }

    pub fn http_client() -> Result<Arc<dyn HttpClient>> {
        Err(missing(
            "HttpClient",
            "An HttpClient is required to reach the token endpoint. \
             Desktop: enable the 'desktop-shims' feature to use reqwest.",
        ))
    }

    pub fn browser_launcher() -> Result<Arc<dyn BrowserLauncher>> {
        Err(missing(
            "BrowserLauncher",
            "A BrowserLauncher is required to open the authorization page. \
             Desktop: enable the 'desktop-shims' feature to use the system browser.",
        ))
    }

    pub fn notifier() -> Option<Arc<dyn Notifier>> {
        None
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    secure_store: Option<Arc<dyn SecureStore>>,
    http_client: Option<Arc<dyn HttpClient>>,
    deep_link_channel: Option<Arc<dyn DeepLinkChannel>>,
    browser_launcher: Option<Arc<dyn BrowserLauncher>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
    auth: Option<AuthSettings>,
}

impl CoreConfigBuilder {
    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the deep-link channel (required).
    ///
    /// The host keeps its own handle to forward OS deliveries into it.
    pub fn deep_link_channel(mut self, channel: Arc<dyn DeepLinkChannel>) -> Self {
        self.deep_link_channel = Some(channel);
        self
    }

    pub fn browser_launcher(mut self, launcher: Arc<dyn BrowserLauncher>) -> Self {
        self.browser_launcher = Some(launcher);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Overrides the time source. Tests use this to pin token expiry.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn auth_settings(mut self, settings: AuthSettings) -> Self {
        self.auth = Some(settings);
        self
    }

    /// Validates and assembles the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge is absent and no
    ///   desktop default applies
    /// - [`Error::InvalidSetting`] when [`AuthSettings::validate`] fails
    pub fn build(self) -> Result<CoreConfig> {
        let deep_link_channel = self.deep_link_channel.ok_or_else(|| {
            missing(
                "DeepLinkChannel",
                "A DeepLinkChannel is required to receive OAuth callbacks. \
                 Desktop: create a bridge_desktop::ChannelDeepLinkChannel, pass a clone here \
                 and forward OS deep-link deliveries to it.",
            )
        })?;

        let secure_store = match self.secure_store {
            Some(store) => store,
            None => defaults::secure_store()?,
        };

        let http_client = match self.http_client {
            Some(client) => client,
            None => defaults::http_client()?,
        };

        let browser_launcher = match self.browser_launcher {
            Some(launcher) => launcher,
            None => defaults::browser_launcher()?,
        };

        let auth = self.auth.unwrap_or_default();
        auth.validate()?;

        Ok(CoreConfig {
            secure_store,
            http_client,
            deep_link_channel,
            browser_launcher,
            notifier: self.notifier.or_else(defaults::notifier),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::deep_link::DeepLinkReceiver;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use std::collections::HashMap;

    struct NullStore;

    #[async_trait]
    impl SecureStore for NullStore {
        async fn set_secret(&self, _key: &str, _value: &[u8]) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_secret(&self, _key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn delete_secret(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct NullHttp;

    #[async_trait]
    impl HttpClient for NullHttp {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse {
                status: 204,
                headers: HashMap::new(),
                body: Default::default(),
            })
        }
    }

    struct NullLinks;

    #[async_trait]
    impl DeepLinkChannel for NullLinks {
        async fn listen(&self, _scheme: &str) -> BridgeResult<DeepLinkReceiver> {
            let (_tx, rx) = core_async::sync::mpsc::unbounded_channel();
            Ok(rx)
        }

        async fn unlisten(&self, _scheme: &str) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct NullBrowser;

    #[async_trait]
    impl BrowserLauncher for NullBrowser {
        async fn open_url(&self, _url: &str) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn full_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .secure_store(Arc::new(NullStore))
            .http_client(Arc::new(NullHttp))
            .deep_link_channel(Arc::new(NullLinks))
            .browser_launcher(Arc::new(NullBrowser))
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_builder_with_all_bridges() {
        let config = full_builder().build().unwrap();
        assert_eq!(config.auth.deep_link_scheme, "clipify");
        assert_eq!(config.auth.environment, Environment::Production);
        assert_eq!(config.auth.max_refresh_failures, 3);
        assert_eq!(config.auth.refresh_check_interval, Duration::from_secs(60));
        assert_eq!(config.auth.refresh_horizon, Duration::from_secs(300));
        assert_eq!(config.auth.pending_request_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_builder_requires_deep_link_channel() {
        let result = CoreConfig::builder()
            .secure_store(Arc::new(NullStore))
            .http_client(Arc::new(NullHttp))
            .browser_launcher(Arc::new(NullBrowser))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "DeepLinkChannel")
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_secure_store_without_shims() {
        let result = CoreConfig::builder()
            .deep_link_channel(Arc::new(NullLinks))
            .build();
        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "SecureStore"
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_builder_uses_desktop_defaults() {
        let config = CoreConfig::builder()
            .deep_link_channel(Arc::new(NullLinks))
            .build()
            .unwrap();
        assert!(config.notifier.is_some());
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut settings = AuthSettings::default();
        settings.deep_link_scheme = "1bad scheme".to_string();
        assert!(matches!(
            full_builder().auth_settings(settings).build(),
            Err(Error::InvalidSetting { field: "deep_link_scheme", .. })
        ));

        let mut settings = AuthSettings::default();
        settings.api_base_url = "ftp://clipify.space".to_string();
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidSetting { field: "api_base_url", .. })
        ));

        let mut settings = AuthSettings::default();
        settings.max_refresh_failures = 0;
        assert!(settings.validate().is_err());

        let mut settings = AuthSettings::default();
        settings.refresh_check_interval = Duration::ZERO;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_environment_defaults() {
        let dev = EnvironmentConfig::from_lookup(lookup(&[]));
        assert_eq!(dev.environment, Environment::Development);
        assert_eq!(dev.api_base_url, "http://localhost:8080");
        assert_eq!(dev.app_base_url, "http://localhost:1420");

        let prod = EnvironmentConfig::from_lookup(lookup(&[("NODE_ENV", "production")]));
        assert_eq!(prod.environment, Environment::Production);
        assert_eq!(
            prod.oauth_base_url,
            "https://clipify.space/api/v1/auth/google/login"
        );
    }

    #[test]
    fn test_environment_overrides() {
        let env = EnvironmentConfig::from_lookup(lookup(&[
            ("NODE_ENV", "production"),
            ("VITE_PROD_API_BASE_URL", "https://api.example.test"),
            ("VITE_DEV_API_BASE_URL", "http://ignored"),
            ("CLIPIFY_DEEP_LINK_SCHEME", "clipify-beta"),
        ]));
        assert_eq!(env.api_base_url, "https://api.example.test");
        assert_eq!(env.deep_link_scheme, "clipify-beta");

        let settings = AuthSettings::from(env);
        assert_eq!(settings.redirect_uri(), "clipify-beta://auth/callback");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_api_endpoint_joins_paths() {
        let mut settings = AuthSettings::default();
        settings.api_base_url = "https://clipify.space/".to_string();
        assert_eq!(
            settings.api_endpoint("/api/v1/auth/token"),
            "https://clipify.space/api/v1/auth/token"
        );
    }

    #[test]
    fn test_config_debug_hides_bridges() {
        let config = full_builder().build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("SecureStore { ... }"));
        assert!(debug.contains("clipify"));
    }
}
