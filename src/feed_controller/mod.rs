//! FeedController - Per-Camera Feed State Machine
//!
//! ## Responsibilities
//!
//! - Stream connection status (online / offline / error)
//! - Local recording session with a one-second elapsed counter
//! - Snapshot capture to the download directory
//! - One-at-a-time AI analysis of the current frame
//!
//! Every task a controller spawns hangs off its cancellation token, so dropping
//! or unmounting the controller releases all of its timers.

mod types;

pub use types::{AnalysisState, Connection, FeedState};

use crate::console_api::ConsoleBackend;
use crate::error::{Error, Result};
use crate::frame_grabber::{to_data_url, FrameSource};
use crate::models::{format_clock, AnalysisReport, AnalyzeRequest, Camera, Notice, NoticeLevel};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::{timeout, Instant};
use tokio_util::sync::CancellationToken;

const TICK: Duration = Duration::from_secs(1);

/// Collaborators shared by every feed of a dashboard
#[derive(Clone)]
pub struct FeedDeps {
    pub backend: Arc<dyn ConsoleBackend>,
    pub frames: Arc<dyn FrameSource>,
    pub download_dir: PathBuf,
    /// Bounds stream loads and frame captures
    pub request_timeout: Duration,
    /// Bounds one analysis round trip
    pub analysis_timeout: Duration,
    pub notices: broadcast::Sender<Notice>,
}

enum Admission {
    Accepted,
    Busy,
    Unhealthy,
}

/// FeedController instance
pub struct FeedController {
    camera: Camera,
    deps: FeedDeps,
    state: Arc<watch::Sender<FeedState>>,
    parent: CancellationToken,
    cancel: CancellationToken,
    /// Cancellation handle of the running recording ticker
    recorder: Mutex<Option<CancellationToken>>,
    /// Identifies the current recording session; stale ticks are ignored
    recording_epoch: Arc<AtomicU64>,
}

impl FeedController {
    /// Mount a feed; online cameras start loading their stream immediately
    pub fn mount(camera: Camera, deps: FeedDeps, parent: &CancellationToken) -> Self {
        let cancel = parent.child_token();
        let (tx, _) = watch::channel(FeedState::for_camera(&camera));
        let state = Arc::new(tx);

        if camera.online {
            tokio::spawn(Self::watch_stream(
                camera.clone(),
                deps.frames.clone(),
                deps.request_timeout,
                state.clone(),
                cancel.clone(),
            ));
        }

        tracing::info!(camera_id = %camera.camera_id, online = camera.online, "Feed mounted");

        Self {
            camera,
            deps,
            state,
            parent: parent.clone(),
            cancel,
            recorder: Mutex::new(None),
            recording_epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Load the stream once; a failed load is the stream-error signal
    async fn watch_stream(
        camera: Camera,
        frames: Arc<dyn FrameSource>,
        request_timeout: Duration,
        state: Arc<watch::Sender<FeedState>>,
        cancel: CancellationToken,
    ) {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            outcome = timeout(request_timeout, frames.probe(&camera)) => outcome,
        };

        match outcome {
            Ok(Ok(())) => {
                tracing::debug!(camera_id = %camera.camera_id, "Stream loaded");
            }
            Ok(Err(e)) => {
                fail_stream(&state, &camera.camera_id, &e.to_string());
            }
            Err(_) => {
                fail_stream(&state, &camera.camera_id, "stream load timed out");
            }
        }
    }

    /// Destroy this feed and mount a fresh one for the same camera
    pub fn remount(self) -> Self {
        let camera = self.camera.clone();
        let deps = self.deps.clone();
        let parent = self.parent.clone();
        drop(self);
        Self::mount(camera, deps, &parent)
    }

    /// Cancel every task owned by this feed
    pub fn unmount(&self) {
        if !self.cancel.is_cancelled() {
            self.cancel.cancel();
            tracing::info!(camera_id = %self.camera.camera_id, "Feed unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_id(&self) -> &str {
        &self.camera.camera_id
    }

    /// Current state snapshot
    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// Stream failed to load; irreversible until remount
    pub fn mark_stream_error(&self, reason: &str) -> bool {
        fail_stream(&self.state, &self.camera.camera_id, reason)
    }

    // ========================================
    // Recording
    // ========================================

    /// Start a recording session; no-op when one is already running
    pub fn start_recording(&self) -> bool {
        if !self.is_mounted() {
            tracing::debug!(camera_id = %self.camera.camera_id, "Recording refused, feed unmounted");
            return false;
        }

        let mut recorder = lock(&self.recorder);
        if recorder.is_some() {
            return false;
        }

        let epoch = self.recording_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| {
            s.recording = true;
            s.recording_seconds = 0;
        });

        let token = self.cancel.child_token();
        tokio::spawn(Self::tick_recording(
            self.state.clone(),
            self.recording_epoch.clone(),
            epoch,
            token.clone(),
        ));
        *recorder = Some(token);

        tracing::info!(camera_id = %self.camera.camera_id, "Recording started");
        true
    }

    async fn tick_recording(
        state: Arc<watch::Sender<FeedState>>,
        current_epoch: Arc<AtomicU64>,
        epoch: u64,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval_at(Instant::now() + TICK, TICK);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            state.send_if_modified(|s| {
                if s.recording && current_epoch.load(Ordering::SeqCst) == epoch {
                    s.recording_seconds += 1;
                    true
                } else {
                    false
                }
            });
        }
    }

    /// Stop recording; the elapsed value stays visible until the next start
    pub fn stop_recording(&self) -> Option<u64> {
        let token = lock(&self.recorder).take()?;
        token.cancel();
        self.recording_epoch.fetch_add(1, Ordering::SeqCst);

        let mut elapsed = 0;
        self.state.send_modify(|s| {
            s.recording = false;
            elapsed = s.recording_seconds;
        });

        tracing::info!(camera_id = %self.camera.camera_id, elapsed_sec = elapsed, "Recording stopped");
        Some(elapsed)
    }

    /// Record button: start or stop, with a notice either way
    pub fn toggle_recording(&self) -> bool {
        match self.stop_recording() {
            Some(elapsed) => {
                self.notify(
                    NoticeLevel::Success,
                    format!("Recording stopped - {}", format_clock(elapsed)),
                );
                false
            }
            None => {
                if !self.start_recording() {
                    return false;
                }
                self.notify(NoticeLevel::Success, "Recording started");
                true
            }
        }
    }

    pub fn toggle_fullscreen(&self) -> bool {
        let mut fullscreen = false;
        self.state.send_modify(|s| {
            s.fullscreen = !s.fullscreen;
            fullscreen = s.fullscreen;
        });
        fullscreen
    }

    // ========================================
    // Snapshot / Analysis
    // ========================================

    async fn capture_frame(&self) -> Result<Vec<u8>> {
        timeout(self.deps.request_timeout, self.deps.frames.capture(&self.camera)).await?
    }

    /// Capture the current frame into the download directory
    pub async fn snapshot(&self) -> Result<PathBuf> {
        if !self.is_mounted() {
            return Err(self.unmounted());
        }

        let healthy = self.state.borrow().is_healthy();
        if !healthy {
            self.notify(NoticeLevel::Error, "Camera offline - cannot capture snapshot");
            return Err(self.unavailable());
        }

        match self.save_snapshot().await {
            Ok(path) => {
                tracing::info!(camera_id = %self.camera.camera_id, path = %path.display(), "Snapshot saved");
                self.notify(NoticeLevel::Success, "Snapshot captured successfully");
                Ok(path)
            }
            Err(e) => {
                tracing::warn!(camera_id = %self.camera.camera_id, error = %e, "Snapshot failed");
                self.notify(NoticeLevel::Error, "Failed to capture snapshot");
                Err(e)
            }
        }
    }

    async fn save_snapshot(&self) -> Result<PathBuf> {
        let frame = self.capture_frame().await?;

        tokio::fs::create_dir_all(&self.deps.download_dir).await?;
        let path = self.deps.download_dir.join(format!(
            "snapshot-{}-{}.jpg",
            dashed(&self.camera.name),
            Utc::now().timestamp_millis()
        ));
        tokio::fs::write(&path, &frame).await?;
        Ok(path)
    }

    /// Submit the current frame for threat analysis
    ///
    /// Rejected without a network call while another analysis is running,
    /// while the stream is unhealthy, or once the feed is unmounted.
    pub async fn analyze(&self) -> Result<AnalysisReport> {
        if !self.is_mounted() {
            return Err(self.unmounted());
        }

        let mut admission = Admission::Accepted;
        self.state.send_if_modified(|s| {
            if s.analysis.is_running() {
                admission = Admission::Busy;
                false
            } else if !s.is_healthy() {
                admission = Admission::Unhealthy;
                false
            } else {
                s.analysis = AnalysisState::Running;
                true
            }
        });

        match admission {
            Admission::Accepted => {}
            Admission::Busy => {
                return Err(Error::Conflict(format!(
                    "analysis already running for camera {}",
                    self.camera.camera_id
                )));
            }
            Admission::Unhealthy => {
                self.notify(NoticeLevel::Error, "Camera offline - cannot analyze");
                return Err(self.unavailable());
            }
        }

        tracing::info!(camera_id = %self.camera.camera_id, "Analysis started");

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Internal("feed unmounted during analysis".to_string())),
            outcome = self.request_analysis() => outcome,
        };

        match &outcome {
            Ok(report) => {
                self.state
                    .send_modify(|s| s.analysis = AnalysisState::Succeeded(report.clone()));
                tracing::info!(
                    camera_id = %self.camera.camera_id,
                    threat_level = %report.threat_level,
                    "Analysis complete"
                );
                self.notify(NoticeLevel::Success, "Analysis complete");
            }
            Err(e) => {
                self.state.send_modify(|s| s.analysis = AnalysisState::Failed);
                tracing::warn!(camera_id = %self.camera.camera_id, error = %e, "Analysis failed");
                self.notify(NoticeLevel::Error, "Analysis failed - check backend connection");
            }
        }

        outcome
    }

    async fn request_analysis(&self) -> Result<AnalysisReport> {
        let frame = self.capture_frame().await?;
        let request = AnalyzeRequest {
            camera_id: self.camera.camera_id.clone(),
            image: to_data_url(&frame),
        };
        timeout(self.deps.analysis_timeout, self.deps.backend.analyze(&request)).await?
    }

    /// Close the analysis result; a running analysis is left alone
    pub fn dismiss_analysis(&self) -> bool {
        self.state.send_if_modified(|s| {
            if s.analysis.is_running() || s.analysis == AnalysisState::Idle {
                false
            } else {
                s.analysis = AnalysisState::Idle;
                true
            }
        })
    }

    fn unavailable(&self) -> Error {
        let connection = self.state.borrow().connection;
        Error::Unavailable {
            camera_id: self.camera.camera_id.clone(),
            message: format!("connection is {:?}", connection),
        }
    }

    fn unmounted(&self) -> Error {
        Error::Unavailable {
            camera_id: self.camera.camera_id.clone(),
            message: "feed unmounted".to_string(),
        }
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        // nobody listening is fine
        let _ = self.deps.notices.send(Notice {
            camera_id: self.camera.camera_id.clone(),
            level,
            message: message.into(),
        });
    }
}

impl Drop for FeedController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn fail_stream(state: &watch::Sender<FeedState>, camera_id: &str, reason: &str) -> bool {
    let failed = state.send_if_modified(|s| {
        if s.connection == Connection::Online {
            s.connection = Connection::Error;
            true
        } else {
            false
        }
    });
    if failed {
        tracing::warn!(camera_id = %camera_id, reason = %reason, "Stream failed, feed in error until remount");
    }
    failed
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Whitespace runs become single dashes
fn dashed(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{report, FakeBackend, FakeFrames, TEST_JPEG};

    struct Rig {
        backend: Arc<FakeBackend>,
        frames: Arc<FakeFrames>,
        deps: FeedDeps,
        notices: broadcast::Receiver<Notice>,
        root: CancellationToken,
        _dir: tempfile::TempDir,
    }

    fn rig(frames: FakeFrames) -> Rig {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let frames = Arc::new(frames);
        let (tx, notices) = broadcast::channel(32);
        let deps = FeedDeps {
            backend: backend.clone(),
            frames: frames.clone(),
            download_dir: dir.path().join("downloads"),
            request_timeout: Duration::from_secs(5),
            analysis_timeout: Duration::from_secs(30),
            notices: tx,
        };
        Rig {
            backend,
            frames,
            deps,
            notices,
            root: CancellationToken::new(),
            _dir: dir,
        }
    }

    fn camera() -> Camera {
        Camera::new("2", "Camera 02 - Back Entrance")
    }

    fn last_notice(rx: &mut broadcast::Receiver<Notice>) -> Option<Notice> {
        let mut last = None;
        while let Ok(n) = rx.try_recv() {
            last = Some(n);
        }
        last
    }

    #[tokio::test(start_paused = true)]
    async fn test_recording_counts_seconds() {
        let rig = rig(FakeFrames::healthy());
        let feed = FeedController::mount(camera(), rig.deps.clone(), &rig.root);

        assert!(feed.start_recording());
        tokio::time::sleep(Duration::from_millis(3500)).await;

        let state = feed.state();
        assert!(state.recording);
        assert_eq!(state.recording_seconds, 3);
        assert_eq!(state.recording_label().as_deref(), Some("REC 00:03"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_noop() {
        let rig = rig(FakeFrames::healthy());
        let feed = FeedController::mount(camera(), rig.deps.clone(), &rig.root);

        assert!(feed.start_recording());
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(!feed.start_recording());
        assert_eq!(feed.state().recording_seconds, 2);

        // still a single ticker
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(feed.state().recording_seconds, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_counter() {
        let rig = rig(FakeFrames::healthy());
        let feed = FeedController::mount(camera(), rig.deps.clone(), &rig.root);

        feed.start_recording();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(feed.stop_recording(), Some(2));
        assert_eq!(feed.stop_recording(), None);

        tokio::time::sleep(Duration::from_secs(3)).await;
        let state = feed.state();
        assert!(!state.recording);
        assert_eq!(state.recording_seconds, 2);

        assert!(feed.start_recording());
        assert_eq!(feed.state().recording_seconds, 0);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(feed.state().recording_seconds, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_recording_notices() {
        let mut rig = rig(FakeFrames::healthy());
        let feed = FeedController::mount(camera(), rig.deps.clone(), &rig.root);

        assert!(feed.toggle_recording());
        assert_eq!(last_notice(&mut rig.notices).unwrap().message, "Recording started");

        tokio::time::sleep(Duration::from_millis(65_500)).await;
        assert!(!feed.toggle_recording());
        assert_eq!(
            last_notice(&mut rig.notices).unwrap().message,
            "Recording stopped - 01:05"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_ticker() {
        let rig = rig(FakeFrames::healthy());
        let feed = FeedController::mount(camera(), rig.deps.clone(), &rig.root);
        let rx = feed.subscribe();

        feed.start_recording();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        drop(feed);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(rx.borrow().recording_seconds, 1);
    }

    #[tokio::test]
    async fn test_stream_error_is_permanent() {
        let rig = rig(FakeFrames::broken_stream());
        let feed = FeedController::mount(camera(), rig.deps.clone(), &rig.root);

        let mut rx = feed.subscribe();
        tokio::time::timeout(
            Duration::from_secs(1),
            rx.wait_for(|s| s.connection == Connection::Error),
        )
        .await
        .unwrap()
        .unwrap();

        // stream comes back, but the mounted feed stays failed
        rig.frames.stream_fails.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(feed.state().connection, Connection::Error);
        assert!(!feed.mark_stream_error("again"));

        let err = feed.analyze().await.unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }));
        assert_eq!(FakeBackend::calls(&rig.backend.analyze_calls), 0);

        let feed = feed.remount();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(feed.state().connection, Connection::Online);
        assert_eq!(rig.frames.probe_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_offline_camera_never_loads() {
        let mut rig = rig(FakeFrames::healthy());
        let mut cam = camera();
        cam.online = false;
        let feed = FeedController::mount(cam, rig.deps.clone(), &rig.root);

        assert!(!feed.mark_stream_error("late error"));
        assert_eq!(feed.state().connection, Connection::Offline);

        assert!(feed.snapshot().await.is_err());
        assert_eq!(
            last_notice(&mut rig.notices).unwrap().message,
            "Camera offline - cannot capture snapshot"
        );
        assert_eq!(rig.frames.probe_calls.load(Ordering::SeqCst), 0);
        assert_eq!(rig.frames.capture_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_snapshot_written_to_downloads() {
        let mut rig = rig(FakeFrames::healthy());
        let feed = FeedController::mount(camera(), rig.deps.clone(), &rig.root);

        let path = feed.snapshot().await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("snapshot-Camera-02---Back-Entrance-"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), TEST_JPEG.to_vec());

        let notice = last_notice(&mut rig.notices).unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.camera_id, "2");
    }

    #[tokio::test]
    async fn test_snapshot_capture_failure() {
        let mut rig = rig(FakeFrames::healthy());
        rig.frames.capture_fails.store(true, Ordering::SeqCst);
        let feed = FeedController::mount(camera(), rig.deps.clone(), &rig.root);

        assert!(matches!(feed.snapshot().await, Err(Error::Capture(_))));
        let notice = last_notice(&mut rig.notices).unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Failed to capture snapshot");
        // capture failure does not touch the connection
        assert_eq!(feed.state().connection, Connection::Online);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_analysis_rejected() {
        let rig = rig(FakeFrames::healthy());
        rig.backend.set_analysis(Some(report("critical")));
        rig.backend.set_analysis_delay(Duration::from_secs(2));
        let feed = Arc::new(FeedController::mount(camera(), rig.deps.clone(), &rig.root));

        let first = {
            let feed = feed.clone();
            tokio::spawn(async move { feed.analyze().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(feed.state().analysis, AnalysisState::Running);

        let second = feed.analyze().await;
        assert!(matches!(second, Err(Error::Conflict(_))));
        assert_eq!(FakeBackend::calls(&rig.backend.analyze_calls), 1);

        let result = first.await.unwrap().unwrap();
        assert_eq!(result, report("critical"));
        assert_eq!(feed.state().analysis, AnalysisState::Succeeded(report("critical")));

        // finished analysis admits the next one
        assert!(feed.analyze().await.is_ok());
        assert_eq!(FakeBackend::calls(&rig.backend.analyze_calls), 2);
    }

    #[tokio::test]
    async fn test_analysis_payload() {
        let rig = rig(FakeFrames::healthy());
        rig.backend.set_analysis(Some(report("low")));
        let feed = FeedController::mount(camera(), rig.deps.clone(), &rig.root);

        feed.analyze().await.unwrap();
        let sent = rig.backend.last_analyze.lock().unwrap().clone().unwrap();
        assert_eq!(sent.camera_id, "2");
        assert_eq!(sent.image, to_data_url(&TEST_JPEG));
    }

    #[tokio::test]
    async fn test_analysis_failure_then_dismiss() {
        let mut rig = rig(FakeFrames::healthy());
        let feed = FeedController::mount(camera(), rig.deps.clone(), &rig.root);

        assert!(feed.analyze().await.is_err());
        assert_eq!(feed.state().analysis, AnalysisState::Failed);
        assert_eq!(
            last_notice(&mut rig.notices).unwrap().message,
            "Analysis failed - check backend connection"
        );
        assert_eq!(FakeBackend::calls(&rig.backend.analyze_calls), 1);

        assert!(feed.dismiss_analysis());
        assert_eq!(feed.state().analysis, AnalysisState::Idle);
        assert!(!feed.dismiss_analysis());
    }

    #[tokio::test(start_paused = true)]
    async fn test_analysis_times_out() {
        let rig = rig(FakeFrames::healthy());
        rig.backend.set_analysis(Some(report("high")));
        rig.backend.set_analysis_delay(Duration::from_secs(120));
        let feed = FeedController::mount(camera(), rig.deps.clone(), &rig.root);

        assert!(matches!(feed.analyze().await, Err(Error::Timeout(_))));
        assert_eq!(feed.state().analysis, AnalysisState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancel_stops_everything() {
        let rig = rig(FakeFrames::healthy());
        let feed = FeedController::mount(camera(), rig.deps.clone(), &rig.root);

        feed.start_recording();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        rig.root.cancel();
        assert!(!feed.is_mounted());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(feed.state().recording_seconds, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmounted_feed_rejects_actions() {
        let mut rig = rig(FakeFrames::healthy());
        rig.backend.set_analysis(Some(report("low")));
        let feed = FeedController::mount(camera(), rig.deps.clone(), &rig.root);
        feed.unmount();

        assert!(!feed.start_recording());
        assert!(!feed.toggle_recording());
        tokio::time::sleep(Duration::from_secs(5)).await;
        let state = feed.state();
        assert!(!state.recording);
        assert_eq!(state.recording_seconds, 0);

        assert!(matches!(feed.analyze().await, Err(Error::Unavailable { .. })));
        assert!(matches!(feed.snapshot().await, Err(Error::Unavailable { .. })));
        assert_eq!(feed.state().analysis, AnalysisState::Idle);
        assert_eq!(FakeBackend::calls(&rig.backend.analyze_calls), 0);
        assert_eq!(rig.frames.capture_calls.load(Ordering::SeqCst), 0);
        assert!(last_notice(&mut rig.notices).is_none());
    }

    #[test]
    fn test_dashed() {
        assert_eq!(dashed("Camera 02 - Back Entrance"), "Camera-02---Back-Entrance");
        assert_eq!(dashed("Main   Hall"), "Main-Hall");
    }

    #[tokio::test]
    async fn test_fullscreen_toggle() {
        let rig = rig(FakeFrames::healthy());
        let feed = FeedController::mount(camera(), rig.deps.clone(), &rig.root);
        assert!(feed.toggle_fullscreen());
        assert!(!feed.toggle_fullscreen());
    }
}
