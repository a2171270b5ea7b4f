//! # Session Manager
//!
//! Owns the session state machine and orchestrates the browser OAuth flow.
//!
//! ```text
//! Initializing --check_existing_auth--> Authenticated | Unauthenticated
//! Unauthenticated --login/signup--> Loading --callback--> Authenticated
//!                                           \--failure--> Unauthenticated + error
//! Authenticated --logout--> Unauthenticated
//! ```
//!
//! ## Overview
//!
//! - Snapshots of [`SessionState`] are published whole on a watch channel
//!   and mirrored on the [`EventBus`] as [`AuthEvent`]s.
//! - State-mutating operations are serialized by an internal lock, so a
//!   callback, a refresh and a logout never interleave.
//! - Failures of user-initiated operations are classified and surfaced in
//!   the state; they are never returned as `Err`.
//!
//! ## Usage
//!
//! ```no_run
//! use core_auth::SessionManager;
//! use core_runtime::config::CoreConfig;
//! use core_runtime::events::EventBus;
//!
//! # async fn example(config: CoreConfig) {
//! let manager = SessionManager::new(&config, EventBus::default());
//! let mut states = manager.subscribe();
//!
//! manager.check_existing_auth().await;
//! if !manager.state().is_authenticated {
//!     manager.login().await;
//! }
//!
//! while states.changed().await.is_ok() {
//!     let state = states.borrow().clone();
//!     if state.is_authenticated {
//!         break;
//!     }
//! }
//! # }
//! ```

use crate::classifier::{classify, ClassifiedError, ErrorKind};
use crate::deep_link::{DeepLinkCorrelator, DeepLinkHandler};
use crate::error::{AuthError, Result};
use crate::exchange::{TokenExchange, TokenExchangeClient};
use crate::pkce::build_auth_url;
use crate::refresh::{RefreshScheduler, TickOutcome};
use crate::token_store::TokenStore;
use crate::types::{AuthCallback, AuthMode, PendingAuthRequest, SessionState, TokenRecord};
use async_trait::async_trait;
use bridge_traits::{BrowserLauncher, Clock, Notifier};
use core_async::sync::{watch, Mutex, MutexGuard};
use core_runtime::config::{AuthSettings, CoreConfig};
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, instrument, warn};

/// Mutable flow data guarded by the operation lock.
#[derive(Default)]
struct Flow {
    pending: Option<PendingAuthRequest>,
}

struct Inner {
    token_store: TokenStore,
    exchange: Arc<dyn TokenExchange>,
    browser: Arc<dyn BrowserLauncher>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Arc<dyn Clock>,
    settings: AuthSettings,
    correlator: DeepLinkCorrelator,
    scheduler: RefreshScheduler,
    event_bus: EventBus,
    state: watch::Sender<SessionState>,
    flow: Mutex<Flow>,
    refresh_failures: AtomicU32,
}

/// The authentication state machine. Cloning shares the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Build a manager talking to the backend over `config.http_client`.
    pub fn new(config: &CoreConfig, event_bus: EventBus) -> Self {
        let exchange = Arc::new(TokenExchangeClient::new(
            &config.auth,
            config.http_client.clone(),
        ));
        Self::with_exchange(config, event_bus, exchange)
    }

    /// Build a manager over a custom [`TokenExchange`].
    pub fn with_exchange(
        config: &CoreConfig,
        event_bus: EventBus,
        exchange: Arc<dyn TokenExchange>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::initializing());

        Self {
            inner: Arc::new(Inner {
                token_store: TokenStore::new(config.secure_store.clone(), config.clock.clone()),
                exchange,
                browser: config.browser_launcher.clone(),
                notifier: config.notifier.clone(),
                clock: config.clock.clone(),
                settings: config.auth.clone(),
                correlator: DeepLinkCorrelator::new(
                    config.deep_link_channel.clone(),
                    config.auth.deep_link_scheme.clone(),
                ),
                scheduler: RefreshScheduler::new(),
                event_bus,
                state,
                flow: Mutex::new(Flow::default()),
                refresh_failures: AtomicU32::new(0),
            }),
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.inner.token_store
    }

    pub fn is_listening(&self) -> bool {
        self.inner.correlator.is_active()
    }

    pub fn is_refresh_scheduled(&self) -> bool {
        self.inner.scheduler.is_running()
    }

    /// Startup check: restore, refresh or discard the stored token.
    ///
    /// Never surfaces an error; any failure discards the token.
    #[instrument(skip(self))]
    pub async fn check_existing_auth(&self) {
        let _flow = self.lock().await;
        self.publish(SessionState::initializing());

        match self.restore_session().await {
            Ok(Some(record)) => {
                info!(user_id = %record.user.id, "Restored existing session");
                self.signed_in(&record);
            }
            Ok(None) => {
                debug!("No usable session at startup");
                self.publish(SessionState::unauthenticated());
            }
            Err(e) => {
                let classified = classify(&e, Some("check_existing_auth"));
                warn!(kind = %classified.kind, error = %e, "Startup auth check failed, discarding token");
                if let Err(remove_err) = self.inner.token_store.remove().await {
                    warn!(error = %remove_err, "Failed to discard token after startup failure");
                }
                self.publish(SessionState::unauthenticated());
            }
        }
    }

    async fn restore_session(&self) -> Result<Option<TokenRecord>> {
        let store = &self.inner.token_store;
        let Some(record) = store.retrieve().await? else {
            return Ok(None);
        };

        if store.is_expired(&record) {
            let Some(refresh_token) = record.refresh_token.as_deref().filter(|t| !t.is_empty())
            else {
                info!("Stored token expired without a refresh token");
                store.remove().await?;
                return Ok(None);
            };

            self.emit(AuthEvent::TokenRefreshing);
            return match self.inner.exchange.refresh_token(refresh_token).await {
                Ok(refreshed) => {
                    store.store(&refreshed).await?;
                    self.emit(AuthEvent::TokenRefreshed {
                        expires_at: refreshed.expires_at,
                    });
                    Ok(Some(refreshed))
                }
                Err(e) => {
                    warn!(error = %e, "Startup refresh failed");
                    store.remove().await?;
                    Ok(None)
                }
            };
        }

        if self.inner.exchange.validate_token(&record.access_token).await? {
            Ok(Some(record))
        } else {
            info!("Stored token was rejected by the backend");
            store.remove().await?;
            Ok(None)
        }
    }

    /// Launch the browser sign-in flow.
    pub async fn login(&self) {
        self.begin(AuthMode::Login).await
    }

    /// Launch the browser sign-up flow.
    pub async fn signup(&self) {
        self.begin(AuthMode::Signup).await
    }

    #[instrument(skip(self))]
    async fn begin(&self, mode: AuthMode) {
        let mut flow = self.lock().await;
        self.inner.state.send_modify(|state| {
            state.error = None;
            state.is_loading = true;
        });

        if !self.inner.correlator.is_active() {
            if let Err(e) = self.inner.correlator.start_listening(self.handler()).await {
                self.fail(&e, mode.as_str());
                return;
            }
        }

        let now = self.inner.clock.now();
        let ttl = self.inner.settings.pending_request_ttl.as_secs() as i64;
        let reusable = flow
            .pending
            .as_ref()
            .is_some_and(|pending| pending.age_secs(now) <= ttl);
        if !reusable {
            flow.pending = Some(PendingAuthRequest::new(mode, now));
        }

        let url = match flow.pending.as_mut() {
            Some(pending) => {
                pending.mode = mode;
                build_auth_url(&self.inner.settings, pending)
            }
            None => Err(AuthError::Other("Pending request missing".to_string())),
        };

        let launched = match url {
            Ok(url) => {
                self.emit(AuthEvent::SigningIn {
                    mode: mode.as_str().to_string(),
                });
                self.inner
                    .browser
                    .open_url(&url)
                    .await
                    .map_err(|e| AuthError::BrowserLaunch(e.to_string()))
            }
            Err(e) => Err(e),
        };

        match launched {
            Ok(()) => info!(%mode, reused = reusable, "Browser launched for authentication"),
            Err(e) => {
                flow.pending = None;
                self.fail(&e, mode.as_str());
            }
        }
    }

    /// Complete the flow with a callback carrying an authorization code.
    #[instrument(skip_all)]
    pub async fn on_auth_callback(&self, callback: AuthCallback) {
        let mut flow = self.lock().await;
        let pending = flow.pending.take();

        if pending.is_none() && self.state().is_authenticated {
            warn!("Ignoring auth callback without a pending request");
            return;
        }

        match self.complete(callback, pending).await {
            Ok(record) => {
                info!(user_id = %record.user.id, "Authentication completed");
                self.signed_in(&record);
                self.notify_success(&format!("Welcome back, {}!", record.user.name))
                    .await;
            }
            Err(e) => {
                let classified = self.fail(&e, "auth_callback");
                self.notify_error(&classified.user_message).await;
            }
        }
    }

    async fn complete(
        &self,
        callback: AuthCallback,
        pending: Option<PendingAuthRequest>,
    ) -> Result<TokenRecord> {
        let pending = pending.ok_or(AuthError::NoPendingRequest)?;

        if let Some(state) = callback.state.as_deref() {
            if state != pending.state() {
                warn!("Callback state does not match the pending request");
                return Err(AuthError::StateMismatch);
            }
        }

        let elapsed_secs = pending.age_secs(self.inner.clock.now());
        if elapsed_secs > self.inner.settings.pending_request_ttl.as_secs() as i64 {
            return Err(AuthError::RequestExpired { elapsed_secs });
        }

        let record = self
            .inner
            .exchange
            .exchange_code_for_token(&callback.code, pending.pkce.verifier())
            .await?;
        self.inner.token_store.store(&record).await?;
        Ok(record)
    }

    /// Report an OAuth error returned by the provider. No network call is made.
    pub async fn on_auth_error(&self, message: &str) {
        self.reject_callback(AuthError::OAuthCallback(message.to_string()))
            .await
    }

    async fn reject_callback(&self, error: AuthError) {
        let mut flow = self.lock().await;
        let pending = flow.pending.take();

        if pending.is_none() && self.state().is_authenticated {
            warn!(error = %error, "Ignoring callback error without a pending request");
            return;
        }

        let classified = self.fail(&error, "auth_callback");
        self.notify_error(&classified.user_message).await;
    }

    /// Abandon an in-flight login/signup without surfacing an error.
    pub async fn cancel_login(&self) {
        let mut flow = self.lock().await;
        if flow.pending.take().is_some() {
            info!("Pending authentication cancelled");
        }
        if self.state().is_loading {
            self.publish(SessionState::unauthenticated());
        }
    }

    /// End the session. Always ends unauthenticated.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let mut flow = self.lock().await;
        self.end_session(&mut flow, None).await;
    }

    async fn end_session(&self, flow: &mut Flow, error: Option<ClassifiedError>) {
        self.inner.scheduler.stop();
        self.inner.correlator.stop_listening().await;
        flow.pending = None;
        self.inner.refresh_failures.store(0, Ordering::SeqCst);

        if let Err(e) = self.inner.token_store.remove().await {
            error!(error = %e, "Failed to delete token during logout");
        }

        self.publish(SessionState {
            error,
            ..SessionState::unauthenticated()
        });
        self.emit(AuthEvent::SignedOut);
        info!("Signed out");
    }

    /// Refresh the access token now. Returns whether it succeeded.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> bool {
        let _flow = self.lock().await;

        match self.refresh_stored().await {
            Ok(record) => {
                self.inner.refresh_failures.store(0, Ordering::SeqCst);
                self.publish(SessionState::authenticated(record.user.clone()));
                if !self.inner.scheduler.is_running() {
                    self.start_refresh_task();
                }
                true
            }
            Err(e) => {
                let classified = classify(&e, Some("refresh"));
                warn!(kind = %classified.kind, error = %e, "Token refresh failed");
                self.emit_error(&classified);
                self.inner.state.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(classified);
                });
                false
            }
        }
    }

    async fn refresh_stored(&self) -> Result<TokenRecord> {
        let store = &self.inner.token_store;
        let record = store.retrieve().await?.ok_or(AuthError::NotSignedIn)?;
        let refresh_token = record
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::NoRefreshToken)?;

        self.emit(AuthEvent::TokenRefreshing);
        let refreshed = self.inner.exchange.refresh_token(refresh_token).await?;
        store.store(&refreshed).await?;
        self.emit(AuthEvent::TokenRefreshed {
            expires_at: refreshed.expires_at,
        });
        Ok(refreshed)
    }

    /// Sign out, then start a new sign-in.
    pub async fn switch_account(&self) {
        self.logout().await;
        self.login().await;
    }

    pub async fn clear_error(&self) {
        let _flow = self.lock().await;
        self.inner.state.send_if_modified(|state| state.error.take().is_some());
    }

    /// One proactive refresh check.
    async fn refresh_check(&self) -> TickOutcome {
        let mut flow = self.lock().await;
        if !self.state().is_authenticated {
            return TickOutcome::Stop;
        }

        let store = &self.inner.token_store;
        let record = match store.retrieve().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!("Token disappeared while signed in");
                self.end_session(&mut flow, None).await;
                return TickOutcome::Stop;
            }
            Err(e) => return self.record_refresh_failure(&mut flow, &e).await,
        };

        let horizon = self.inner.settings.refresh_horizon.as_secs() as i64;
        if !record.expires_within(store.now_seconds(), horizon) {
            return TickOutcome::Continue;
        }

        if !record.can_refresh() {
            if store.is_expired(&record) {
                let expired = ClassifiedError::new(ErrorKind::TokenExpired, "Access token expired");
                self.end_session(&mut flow, Some(expired)).await;
                return TickOutcome::Stop;
            }
            return TickOutcome::Continue;
        }

        match self.refresh_stored().await {
            Ok(refreshed) => {
                self.inner.refresh_failures.store(0, Ordering::SeqCst);
                self.publish(SessionState::authenticated(refreshed.user));
                TickOutcome::Continue
            }
            Err(e) => self.record_refresh_failure(&mut flow, &e).await,
        }
    }

    async fn record_refresh_failure(&self, flow: &mut Flow, e: &AuthError) -> TickOutcome {
        let classified = classify(e, Some("proactive_refresh"));
        let failures = self.inner.refresh_failures.fetch_add(1, Ordering::SeqCst) + 1;
        let max_failures = self.inner.settings.max_refresh_failures;
        warn!(
            kind = %classified.kind,
            failures,
            max_failures,
            error = %e,
            "Proactive refresh failed"
        );

        if classified.kind == ErrorKind::InvalidToken || failures >= max_failures {
            self.emit_error(&classified);
            self.end_session(flow, Some(classified)).await;
            TickOutcome::Stop
        } else {
            TickOutcome::Continue
        }
    }

    fn start_refresh_task(&self) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner
            .scheduler
            .start(self.inner.settings.refresh_check_interval, move || {
                let weak = weak.clone();
                async move {
                    let Some(inner) = weak.upgrade() else {
                        return TickOutcome::Stop;
                    };
                    let manager = SessionManager { inner };
                    manager.refresh_check().await
                }
            });
    }

    fn handler(&self) -> Arc<dyn DeepLinkHandler> {
        Arc::new(CallbackRouter {
            inner: Arc::downgrade(&self.inner),
        })
    }

    fn signed_in(&self, record: &TokenRecord) {
        self.inner.refresh_failures.store(0, Ordering::SeqCst);
        self.publish(SessionState::authenticated(record.user.clone()));
        self.emit(AuthEvent::SignedIn {
            user_id: record.user.id.clone(),
            expires_at: record.expires_at,
        });
        self.start_refresh_task();
    }

    /// Classify, publish as unauthenticated + error, and mirror on the bus.
    fn fail(&self, e: &AuthError, context: &str) -> ClassifiedError {
        let classified = classify(e, Some(context));
        warn!(kind = %classified.kind, context, error = %e, "Authentication failed");
        self.emit_error(&classified);
        self.publish(SessionState::failed(classified.clone()));
        classified
    }

    fn emit_error(&self, classified: &ClassifiedError) {
        self.emit(AuthEvent::AuthError {
            kind: classified.kind.code().to_string(),
            message: classified.user_message.clone(),
            recoverable: classified.retryable,
        });
    }

    fn publish(&self, state: SessionState) {
        self.inner.state.send_replace(state);
    }

    fn emit(&self, event: AuthEvent) {
        let _ = self.inner.event_bus.emit(CoreEvent::Auth(event));
    }

    async fn lock(&self) -> MutexGuard<'_, Flow> {
        self.inner.flow.lock().await
    }

    async fn notify_success(&self, message: &str) {
        if let Some(notifier) = &self.inner.notifier {
            if let Err(e) = notifier.auth_success(message).await {
                debug!(error = %e, "Success notification failed");
            }
        }
    }

    async fn notify_error(&self, message: &str) {
        if let Some(notifier) = &self.inner.notifier {
            if let Err(e) = notifier.auth_error(message).await {
                debug!(error = %e, "Error notification failed");
            }
        }
    }
}

/// Routes correlator callbacks back into the manager without keeping it alive.
struct CallbackRouter {
    inner: Weak<Inner>,
}

impl CallbackRouter {
    fn manager(&self) -> Option<SessionManager> {
        self.inner.upgrade().map(|inner| SessionManager { inner })
    }
}

#[async_trait]
impl DeepLinkHandler for CallbackRouter {
    async fn on_auth_callback(&self, callback: AuthCallback) {
        if let Some(manager) = self.manager() {
            manager.on_auth_callback(callback).await;
        }
    }

    async fn on_error(&self, error: AuthError) {
        if let Some(manager) = self.manager() {
            manager.reject_callback(error).await;
        }
    }
}
