//! # Deep-Link Correlator
//!
//! Listens for `<scheme>://auth/callback?...` URIs delivered by the OS and
//! dispatches them to a single [`DeepLinkHandler`].
//!
//! ```text
//! Inactive --start_listening--> Listening --stop_listening--> Inactive
//!                                  |
//!                                  +--channel closed--> Inactive
//! ```
//!
//! The listener stays armed after each callback. URIs are handled one at a
//! time in delivery order; the next URI is not read until the handler
//! returns.

use crate::error::{AuthError, Result};
use crate::types::AuthCallback;
use async_trait::async_trait;
use bridge_traits::deep_link::{DeepLinkChannel, DeepLinkReceiver};
use core_async::sync::{CancellationToken, Mutex};
use core_async::task::{spawn, JoinHandle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

const CALLBACK_HOST: &str = "auth";
const CALLBACK_PATH: &str = "/callback";

/// Receiver of parsed callbacks.
#[async_trait]
pub trait DeepLinkHandler: Send + Sync {
    /// A callback carrying an authorization code.
    async fn on_auth_callback(&self, callback: AuthCallback);

    /// A callback carrying an OAuth `error`, or a URI that could not be used.
    ///
    /// `error` is [`AuthError::OAuthCallback`] or [`AuthError::DeepLink`].
    async fn on_error(&self, error: AuthError);
}

/// Extract the callback parameters from `uri`.
///
/// `error` takes precedence over `code`; `error_description` is appended to
/// the message when present.
pub fn parse_callback_uri(uri: &str, scheme: &str) -> Result<AuthCallback> {
    let url = Url::parse(uri)
        .map_err(|e| AuthError::DeepLink(format!("Malformed deep link: {}", e)))?;

    if !url.scheme().eq_ignore_ascii_case(scheme) {
        return Err(AuthError::DeepLink(format!(
            "Unexpected deep link scheme '{}'",
            url.scheme()
        )));
    }

    let path = url.path().trim_end_matches('/');
    if url.host_str() != Some(CALLBACK_HOST) || path != CALLBACK_PATH {
        return Err(AuthError::DeepLink(format!(
            "Unexpected deep link target '{}{}'",
            url.host_str().unwrap_or_default(),
            url.path()
        )));
    }

    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        let message = match description {
            Some(description) if !description.is_empty() => format!("{}: {}", error, description),
            _ => error,
        };
        return Err(AuthError::OAuthCallback(message));
    }

    match code {
        Some(code) if !code.is_empty() => Ok(AuthCallback {
            code,
            state: state.filter(|s| !s.is_empty()),
        }),
        _ => Err(AuthError::DeepLink(
            "Deep link did not contain an authorization code".to_string(),
        )),
    }
}

type HandlerSlot = Arc<Mutex<Arc<dyn DeepLinkHandler>>>;

struct Listener {
    handler: HandlerSlot,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Start/stop state machine around a [`DeepLinkChannel`].
pub struct DeepLinkCorrelator {
    channel: Arc<dyn DeepLinkChannel>,
    scheme: String,
    listener: Mutex<Option<Listener>>,
    /// Generation of the running listener task, `0` when none.
    active: Arc<AtomicU64>,
    generations: AtomicU64,
}

impl DeepLinkCorrelator {
    pub fn new(channel: Arc<dyn DeepLinkChannel>, scheme: impl Into<String>) -> Self {
        Self {
            channel,
            scheme: scheme.into(),
            listener: Mutex::new(None),
            active: Arc::new(AtomicU64::new(0)),
            generations: AtomicU64::new(0),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Register `handler` and start listening.
    ///
    /// When already listening only the handler is replaced; the OS listener
    /// is not registered twice.
    pub async fn start_listening(&self, handler: Arc<dyn DeepLinkHandler>) -> Result<()> {
        let mut listener = self.listener.lock().await;

        if let Some(existing) = listener.as_ref() {
            if !existing.task.is_finished() {
                *existing.handler.lock().await = handler;
                debug!(scheme = %self.scheme, "Deep-link handler replaced");
                return Ok(());
            }
        }

        let receiver = self.channel.listen(&self.scheme).await.map_err(|e| {
            warn!(scheme = %self.scheme, error = %e, "Failed to register deep-link listener");
            AuthError::DeepLink(format!("Failed to listen for deep links: {}", e))
        })?;

        let slot: HandlerSlot = Arc::new(Mutex::new(handler));
        let cancel = CancellationToken::new();
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        self.active.store(generation, Ordering::SeqCst);
        let task = spawn(run_listener(
            receiver,
            slot.clone(),
            cancel.clone(),
            self.scheme.clone(),
            ListenerGuard {
                active: self.active.clone(),
                generation,
            },
        ));

        *listener = Some(Listener {
            handler: slot,
            cancel,
            task,
        });
        info!(scheme = %self.scheme, "Listening for auth callbacks");
        Ok(())
    }

    /// Tear down the listener. Safe to call when not listening.
    pub async fn stop_listening(&self) {
        let Some(listener) = self.listener.lock().await.take() else {
            return;
        };
        self.active.store(0, Ordering::SeqCst);
        listener.cancel.cancel();

        if let Err(e) = self.channel.unlisten(&self.scheme).await {
            warn!(scheme = %self.scheme, error = %e, "Failed to unregister deep-link listener");
        }
        info!(scheme = %self.scheme, "Stopped listening for auth callbacks");
    }

    /// False once the listener task has exited, including when the host
    /// closed the channel without `stop_listening`.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) != 0
    }
}

/// Marks the correlator inactive when its listener task exits.
struct ListenerGuard {
    active: Arc<AtomicU64>,
    generation: u64,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        // A newer listener may already own the flag.
        let _ = self
            .active
            .compare_exchange(self.generation, 0, Ordering::SeqCst, Ordering::SeqCst);
    }
}

async fn run_listener(
    mut receiver: DeepLinkReceiver,
    handler: HandlerSlot,
    cancel: CancellationToken,
    scheme: String,
    _guard: ListenerGuard,
) {
    loop {
        let uri = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            uri = receiver.recv() => uri,
        };

        let Some(uri) = uri else {
            debug!(scheme = %scheme, "Deep-link channel closed");
            break;
        };

        let handler = handler.lock().await.clone();
        match parse_callback_uri(&uri, &scheme) {
            Ok(callback) => {
                debug!(has_state = callback.state.is_some(), "Auth callback received");
                handler.on_auth_callback(callback).await;
            }
            Err(error) => {
                warn!(error = %error, "Unusable auth callback");
                handler.on_error(error).await;
            }
        }
    }
}
