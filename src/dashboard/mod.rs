//! Dashboard - Authenticated Control Center
//!
//! ## Responsibilities
//!
//! - Refuse to mount without an authenticated session
//! - Mount one FeedController per configured camera and the sidebar
//! - Tear everything down when the session leaves `Authenticated`
//!
//! All controllers share one parent cancellation token, so unmount is a single
//! cancel.

use crate::error::{Error, Result};
use crate::feed_controller::{FeedController, FeedDeps, FeedState};
use crate::models::Notice;
use crate::session_store::{SessionStatus, SessionStore, PROTECTED_PREFIX};
use crate::sidebar::{SidebarAggregator, SidebarConfig};
use crate::state::ConsoleState;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Notice channel depth
const NOTICE_CAPACITY: usize = 64;

/// Dashboard instance
pub struct Dashboard {
    session: Arc<SessionStore>,
    deps: FeedDeps,
    feeds: RwLock<Vec<Arc<FeedController>>>,
    sidebar: SidebarAggregator,
    cancel: CancellationToken,
}

impl Dashboard {
    /// Mount the control center for the current session
    pub fn mount(state: &ConsoleState) -> Result<Self> {
        if !state.session.is_authenticated() {
            tracing::info!(session = %state.session.id(), "Dashboard refused, not authenticated");
            return Err(Error::Unauthorized(
                "dashboard requires an authenticated session".to_string(),
            ));
        }

        state.session.navigate(PROTECTED_PREFIX);

        let cancel = CancellationToken::new();
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let deps = FeedDeps {
            backend: state.backend.clone(),
            frames: state.frames.clone(),
            download_dir: state.config.download_dir.clone(),
            request_timeout: state.config.request_timeout,
            analysis_timeout: state.config.analysis_timeout,
            notices,
        };

        let feeds = state
            .cameras
            .iter()
            .map(|camera| Arc::new(FeedController::mount(camera.clone(), deps.clone(), &cancel)))
            .collect::<Vec<_>>();

        let sidebar = SidebarAggregator::mount(
            state.backend.clone(),
            SidebarConfig::from(&state.config),
            state.session.subscribe_route(),
            state.session.user(),
            &cancel,
        );

        Self::guard_session(&state.session, cancel.clone());

        tracing::info!(
            session = %state.session.id(),
            feeds = feeds.len(),
            "Dashboard mounted"
        );

        Ok(Self {
            session: state.session.clone(),
            deps,
            feeds: RwLock::new(feeds),
            sidebar,
            cancel,
        })
    }

    /// Cancel the dashboard once the session is no longer authenticated
    fn guard_session(session: &SessionStore, cancel: CancellationToken) {
        let mut rx = session.subscribe();
        let id = session.id();

        tokio::spawn(async move {
            let signed_out = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                changed = rx.wait_for(|s| s.status != SessionStatus::Authenticated) => changed.is_ok(),
            };

            if signed_out {
                tracing::info!(session = %id, "Session ended, tearing down dashboard");
            }
            cancel.cancel();
        });
    }

    pub fn feeds(&self) -> Vec<Arc<FeedController>> {
        read(&self.feeds).clone()
    }

    pub fn feed(&self, camera_id: &str) -> Option<Arc<FeedController>> {
        read(&self.feeds)
            .iter()
            .find(|f| f.camera_id() == camera_id)
            .cloned()
    }

    /// Current state of every feed, in roster order
    pub fn feed_states(&self) -> Vec<FeedState> {
        read(&self.feeds).iter().map(|f| f.state()).collect()
    }

    /// Replace a feed with a freshly mounted one; the only way out of a stream error
    pub fn remount_feed(&self, camera_id: &str) -> Option<Arc<FeedController>> {
        if !self.is_active() {
            return None;
        }

        let mut feeds = self.feeds.write().unwrap_or_else(|e| e.into_inner());
        let slot = feeds.iter_mut().find(|f| f.camera_id() == camera_id)?;

        slot.unmount();
        let fresh = Arc::new(FeedController::mount(
            slot.camera().clone(),
            self.deps.clone(),
            &self.cancel,
        ));
        *slot = fresh.clone();
        Some(fresh)
    }

    /// Toasts raised by feed actions
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.deps.notices.subscribe()
    }

    pub fn sidebar(&self) -> &SidebarAggregator {
        &self.sidebar
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Release every feed timer, poller and the session clock
    pub fn unmount(&self) {
        if !self.cancel.is_cancelled() {
            self.cancel.cancel();
            tracing::info!(session = %self.session.id(), "Dashboard unmounted");
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}
