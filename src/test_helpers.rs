//! In-memory fakes shared by unit tests

use crate::console_api::ConsoleBackend;
use crate::error::{Error, Result};
use crate::frame_grabber::FrameSource;
use crate::models::{
    AnalysisReport, AnalyzeRequest, Camera, SecurityEvent, Severity, TelemetrySample,
    TokenResponse, User,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const VALID_TOKEN: &str = "valid-token";
pub const TEST_JPEG: [u8; 6] = [0xFF, 0xD8, 0x10, 0x20, 0xFF, 0xD9];

pub fn operator() -> User {
    User {
        id: "1".to_string(),
        username: "operator".to_string(),
        email: Some("operator@safesight.local".to_string()),
        full_name: Some("Night Operator".to_string()),
        role: Some("admin".to_string()),
        is_active: true,
    }
}

pub fn report(threat_level: &str) -> AnalysisReport {
    AnalysisReport {
        threat_level: threat_level.to_string(),
        summary: "Two people near the loading dock".to_string(),
        objects: vec![],
        threats: vec![],
    }
}

pub fn event(id: &str, severity: Severity) -> SecurityEvent {
    SecurityEvent {
        id: id.to_string(),
        timestamp: "12:00:00".to_string(),
        message: format!("event {}", id),
        severity,
    }
}

fn server_error() -> Error {
    Error::Api {
        status: 500,
        message: "Internal Server Error".to_string(),
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Scriptable backend; `None` responses answer with HTTP 500
pub struct FakeBackend {
    pub telemetry: Mutex<Option<TelemetrySample>>,
    pub events: Mutex<Option<Vec<SecurityEvent>>>,
    pub analysis: Mutex<Option<AnalysisReport>>,
    pub analysis_delay: Mutex<Duration>,
    pub identity_delay: Mutex<Duration>,
    pub me_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub telemetry_calls: AtomicUsize,
    pub events_calls: AtomicUsize,
    pub analyze_calls: AtomicUsize,
    pub last_analyze: Mutex<Option<AnalyzeRequest>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            telemetry: Mutex::new(None),
            events: Mutex::new(None),
            analysis: Mutex::new(None),
            analysis_delay: Mutex::new(Duration::ZERO),
            identity_delay: Mutex::new(Duration::ZERO),
            me_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            telemetry_calls: AtomicUsize::new(0),
            events_calls: AtomicUsize::new(0),
            analyze_calls: AtomicUsize::new(0),
            last_analyze: Mutex::new(None),
        }
    }

    pub fn set_telemetry(&self, sample: Option<TelemetrySample>) {
        *lock(&self.telemetry) = sample;
    }

    pub fn set_events(&self, events: Option<Vec<SecurityEvent>>) {
        *lock(&self.events) = events;
    }

    pub fn set_analysis(&self, report: Option<AnalysisReport>) {
        *lock(&self.analysis) = report;
    }

    pub fn set_analysis_delay(&self, delay: Duration) {
        *lock(&self.analysis_delay) = delay;
    }

    pub fn set_identity_delay(&self, delay: Duration) {
        *lock(&self.identity_delay) = delay;
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConsoleBackend for FakeBackend {
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if username == "operator" && password == "secret" {
            Ok(TokenResponse {
                access_token: VALID_TOKEN.to_string(),
                refresh_token: None,
                token_type: "bearer".to_string(),
            })
        } else {
            Err(Error::Unauthorized("Incorrect username or password".to_string()))
        }
    }

    async fn current_user(&self, token: &str) -> Result<User> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.identity_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if token == VALID_TOKEN {
            Ok(operator())
        } else {
            Err(Error::Api {
                status: 401,
                message: "Could not validate credentials".to_string(),
            })
        }
    }

    async fn telemetry(&self) -> Result<TelemetrySample> {
        self.telemetry_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.telemetry).ok_or_else(server_error)
    }

    async fn events(&self) -> Result<Vec<SecurityEvent>> {
        self.events_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.events).clone().ok_or_else(server_error)
    }

    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisReport> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_analyze) = Some(request.clone());
        let delay = *lock(&self.analysis_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        lock(&self.analysis).clone().ok_or_else(server_error)
    }
}

/// Frame source with switchable failures
pub struct FakeFrames {
    pub stream_fails: AtomicBool,
    pub capture_fails: AtomicBool,
    pub probe_calls: AtomicUsize,
    pub capture_calls: AtomicUsize,
}

impl FakeFrames {
    pub fn healthy() -> Self {
        Self {
            stream_fails: AtomicBool::new(false),
            capture_fails: AtomicBool::new(false),
            probe_calls: AtomicUsize::new(0),
            capture_calls: AtomicUsize::new(0),
        }
    }

    pub fn broken_stream() -> Self {
        let frames = Self::healthy();
        frames.stream_fails.store(true, Ordering::SeqCst);
        frames
    }
}

#[async_trait]
impl FrameSource for FakeFrames {
    async fn probe(&self, camera: &Camera) -> Result<()> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if self.stream_fails.load(Ordering::SeqCst) {
            return Err(Error::Api {
                status: 404,
                message: format!("no stream for {}", camera.camera_id),
            });
        }
        Ok(())
    }

    async fn capture(&self, _camera: &Camera) -> Result<Vec<u8>> {
        self.capture_calls.fetch_add(1, Ordering::SeqCst);
        if self.capture_fails.load(Ordering::SeqCst) {
            return Err(Error::Capture("cross-origin frame".to_string()));
        }
        Ok(TEST_JPEG.to_vec())
    }
}
