//! SessionStore - Operator Authentication State
//!
//! ## Responsibilities
//!
//! - Validate the stored access token against `/auth/me`
//! - Login / logout
//! - Keep every open console instance in sync through the session bus
//! - Guard protected routes (`/dashboard/*`)
//!
//! ## State machine
//!
//! `Loading -> {Authenticated, Unauthenticated}`, `Authenticated -> Unauthenticated`
//! on logout or failed re-validation. Nothing returns to `Loading`.

mod token_store;

pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

use crate::console_api::ConsoleBackend;
use crate::error::{Error, Result};
use crate::models::User;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Storage key of the access token
pub const TOKEN_KEY: &str = "access_token";

/// Route unauthenticated operators are sent to
pub const LOGIN_ROUTE: &str = "/login";

/// Routes under this prefix require authentication
pub const PROTECTED_PREFIX: &str = "/dashboard";

const BUS_CAPACITY: usize = 16;

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Current session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub status: SessionStatus,
    pub user: Option<User>,
    pub token: Option<String>,
}

impl Session {
    fn loading() -> Self {
        Self {
            status: SessionStatus::Loading,
            user: None,
            token: None,
        }
    }
}

/// Why other instances should look at the session again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSignal {
    /// A fresh token was stored after login
    TokenStored,
    /// The stored token was replaced
    TokenRefreshed,
    /// The token was cleared
    Logout,
}

/// Signal plus the instance that published it
#[derive(Debug, Clone)]
pub struct SessionEnvelope {
    pub origin: Uuid,
    pub signal: SessionSignal,
}

/// Broadcast link between session store instances
#[derive(Clone)]
pub struct SessionBus {
    tx: broadcast::Sender<SessionEnvelope>,
}

impl SessionBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, origin: Uuid, signal: SessionSignal) {
        // no subscribers is fine
        let _ = self.tx.send(SessionEnvelope { origin, signal });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEnvelope> {
        self.tx.subscribe()
    }
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a route requires an authenticated session
pub fn is_protected(route: &str) -> bool {
    route == PROTECTED_PREFIX || route.starts_with(&format!("{}/", PROTECTED_PREFIX))
}

/// SessionStore instance
pub struct SessionStore {
    id: Uuid,
    backend: Arc<dyn ConsoleBackend>,
    tokens: Arc<dyn TokenStore>,
    bus: SessionBus,
    timeout: Duration,
    state: watch::Sender<Session>,
    route: watch::Sender<String>,
    /// Bumped on every forced sign-out so stale validations are dropped
    epoch: AtomicU64,
    cancel: CancellationToken,
}

impl SessionStore {
    /// Create a store in `Loading` state without validating
    fn new(
        backend: Arc<dyn ConsoleBackend>,
        tokens: Arc<dyn TokenStore>,
        bus: SessionBus,
        request_timeout: Duration,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(Session::loading());
        let (route, _) = watch::channel("/".to_string());

        Arc::new(Self {
            id: Uuid::new_v4(),
            backend,
            tokens,
            bus,
            timeout: request_timeout,
            state,
            route,
            epoch: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        })
    }

    /// Create a store, subscribe it to the bus and resolve the initial session
    pub async fn open(
        backend: Arc<dyn ConsoleBackend>,
        tokens: Arc<dyn TokenStore>,
        bus: SessionBus,
        request_timeout: Duration,
    ) -> Arc<Self> {
        let store = Self::new(backend, tokens, bus, request_timeout);
        store.listen();
        store.refresh().await;
        store
    }

    /// Follow signals published by other instances
    fn listen(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let mut rx = self.bus.subscribe();
        let cancel = self.cancel.clone();
        let id = self.id;

        tokio::spawn(async move {
            loop {
                let msg = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    msg = rx.recv() => msg,
                };

                match msg {
                    Ok(envelope) if envelope.origin == id => continue,
                    Ok(envelope) => {
                        let Some(store) = weak.upgrade() else { break };
                        store.on_signal(envelope.signal).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(session = %id, skipped, "Session bus lagged, re-validating");
                        let Some(store) = weak.upgrade() else { break };
                        store.refresh().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!(session = %id, "Session listener stopped");
        });
    }

    async fn on_signal(&self, signal: SessionSignal) {
        tracing::debug!(session = %self.id, signal = ?signal, "Session signal received");
        match signal {
            SessionSignal::Logout => self.sign_out(),
            SessionSignal::TokenStored | SessionSignal::TokenRefreshed => {
                self.refresh().await;
            }
        }
    }

    /// Resolve the stored token to a user
    ///
    /// No token means no network call. A non-success answer discards the token;
    /// transport failures and timeouts only report "not authenticated".
    pub async fn validate(&self) -> Option<User> {
        let token = self.tokens.load().await?;

        match timeout(self.timeout, self.backend.current_user(&token)).await {
            Ok(Ok(user)) => Some(user),
            Ok(Err(e @ Error::Api { .. })) | Ok(Err(e @ Error::Unauthorized(_))) => {
                tracing::info!(session = %self.id, error = %e, "Stored token rejected, discarding");
                if let Err(e) = self.tokens.clear().await {
                    tracing::warn!(error = %e, "Failed to clear rejected token");
                }
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(session = %self.id, error = %e, "Session check failed");
                None
            }
            Err(_) => {
                tracing::warn!(session = %self.id, timeout = ?self.timeout, "Session check timed out");
                None
            }
        }
    }

    /// Re-run validation and publish the result
    pub async fn refresh(&self) -> SessionStatus {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let user = self.validate().await;
        let token = self.tokens.load().await;

        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!(session = %self.id, "Signed out during validation, dropping result");
            return self.status();
        }

        let status = if user.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Unauthenticated
        };

        self.state.send_modify(|s| {
            s.status = status;
            s.user = user;
            s.token = if status == SessionStatus::Authenticated { token } else { None };
        });
        self.guard_route();

        tracing::info!(session = %self.id, status = ?status, "Session resolved");
        status
    }

    /// Exchange credentials for a token and validate it
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let resp = timeout(self.timeout, self.backend.login(username, password)).await??;
        self.tokens.save(&resp.access_token).await?;
        self.bus.publish(self.id, SessionSignal::TokenStored);

        match self.refresh().await {
            SessionStatus::Authenticated => self
                .user()
                .ok_or_else(|| Error::Internal("authenticated without user".to_string())),
            _ => Err(Error::Unauthorized("issued token was rejected".to_string())),
        }
    }

    /// Replace the stored token (e.g. after a refresh) and re-validate everywhere
    pub async fn adopt_token(&self, token: &str) -> Result<SessionStatus> {
        self.tokens.save(token).await?;
        self.bus.publish(self.id, SessionSignal::TokenRefreshed);
        Ok(self.refresh().await)
    }

    /// Clear the token, notify other instances and leave for the login route
    pub async fn logout(&self) {
        if let Err(e) = self.tokens.clear().await {
            tracing::warn!(error = %e, "Failed to clear access token");
        }
        self.sign_out();
        self.bus.publish(self.id, SessionSignal::Logout);
        self.route.send_replace(LOGIN_ROUTE.to_string());
        tracing::info!(session = %self.id, "Logged out");
    }

    fn sign_out(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|s| {
            s.status = SessionStatus::Unauthenticated;
            s.user = None;
            s.token = None;
        });
        self.guard_route();
    }

    /// Navigate; protected routes bounce to `/login` when unauthenticated
    pub fn navigate(&self, route: &str) -> String {
        self.route.send_replace(route.to_string());
        self.guard_route();
        self.route()
    }

    fn guard_route(&self) {
        if self.status() != SessionStatus::Unauthenticated {
            return;
        }
        let redirected = self.route.send_if_modified(|route| {
            if is_protected(route) {
                *route = LOGIN_ROUTE.to_string();
                true
            } else {
                false
            }
        });
        if redirected {
            tracing::info!(session = %self.id, "Unauthenticated on protected route, redirecting to login");
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.borrow().status
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn route(&self) -> String {
        self.route.borrow().clone()
    }

    pub fn subscribe_route(&self) -> watch::Receiver<String> {
        self.route.subscribe()
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
