//! Application state
//!
//! Holds the configuration and the shared components the dashboard is built from

use crate::console_api::{ConsoleApi, ConsoleBackend};
use crate::error::{Error, Result};
use crate::frame_grabber::{FrameSource, MjpegGrabber};
use crate::models::Camera;
use crate::session_store::SessionStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Backend API base URL (including `/api/v1`)
    pub api_url: String,
    /// MJPEG stream endpoint, `camera_id` is appended as query parameter
    pub stream_url: String,
    /// Directory holding the persisted access token
    pub state_dir: PathBuf,
    /// Directory snapshots are downloaded to
    pub download_dir: PathBuf,
    /// Timeout for session/polling/stream requests
    pub request_timeout: Duration,
    /// Timeout for AI analysis requests
    pub analysis_timeout: Duration,
    /// Telemetry poll interval
    pub telemetry_interval: Duration,
    /// Event log poll interval
    pub events_interval: Duration,
    /// Optional JSON camera roster
    pub cameras_file: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: std::env::var("CONSOLE_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000/api/v1".to_string()),
            stream_url: std::env::var("CONSOLE_STREAM_URL")
                .unwrap_or_else(|_| "http://localhost:5000/video_feed".to_string()),
            state_dir: std::env::var("CONSOLE_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".safesight")),
            download_dir: std::env::var("CONSOLE_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("downloads")),
            request_timeout: env_secs("CONSOLE_REQUEST_TIMEOUT_SECS", 10),
            analysis_timeout: env_secs("CONSOLE_ANALYSIS_TIMEOUT_SECS", 30),
            telemetry_interval: Duration::from_secs(2),
            events_interval: Duration::from_secs(5),
            cameras_file: std::env::var("CONSOLE_CAMERAS_FILE").ok().map(PathBuf::from),
        }
    }
}

fn env_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(
        std::env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}

impl ConsoleConfig {
    /// Camera roster: the configured JSON file, or the built-in control-center layout
    pub async fn load_cameras(&self) -> Result<Vec<Camera>> {
        let Some(path) = &self.cameras_file else {
            return Ok(Camera::default_roster());
        };

        let raw = tokio::fs::read_to_string(path).await?;
        let cameras: Vec<Camera> = serde_json::from_str(&raw)?;
        if cameras.is_empty() {
            return Err(Error::Config(format!(
                "camera roster {} is empty",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), count = cameras.len(), "Camera roster loaded");
        Ok(cameras)
    }

    /// Path of the persisted access token
    pub fn token_path(&self) -> PathBuf {
        self.state_dir.join(crate::session_store::TOKEN_KEY)
    }
}

/// Shared components the dashboard is mounted from
#[derive(Clone)]
pub struct ConsoleState {
    /// Application config
    pub config: ConsoleConfig,
    /// Backend adapter
    pub backend: Arc<dyn ConsoleBackend>,
    /// Frame capture for snapshots and analysis
    pub frames: Arc<dyn FrameSource>,
    /// Camera roster
    pub cameras: Vec<Camera>,
    /// Process-wide session
    pub session: Arc<SessionStore>,
}

impl ConsoleState {
    /// Build the HTTP-backed components from config
    pub fn http_components(
        config: &ConsoleConfig,
    ) -> Result<(Arc<ConsoleApi>, Arc<MjpegGrabber>)> {
        let api = ConsoleApi::with_timeout(config.api_url.clone(), config.request_timeout)?;
        let grabber = MjpegGrabber::new(config.stream_url.clone(), config.request_timeout)?;
        Ok((Arc::new(api), Arc::new(grabber)))
    }
}
