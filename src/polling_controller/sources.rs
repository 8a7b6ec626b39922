//! Sidebar poll sources: telemetry with a bounded random walk, event log with hold-last

use super::PollSource;
use crate::console_api::ConsoleBackend;
use crate::error::Result;
use crate::models::{SecurityEvent, TelemetrySample};
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;

/// Range and step of one random-walk field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkBounds {
    pub min: f64,
    pub max: f64,
    /// Full width of the jitter window; each step moves by at most `step / 2`
    pub step: f64,
}

impl WalkBounds {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// `clamp(prev + uniform(-step/2, +step/2), min, max)`
    pub fn next<R: Rng>(&self, prev: f64, rng: &mut R) -> f64 {
        let half = self.step / 2.0;
        let jitter = if half > 0.0 { rng.gen_range(-half..=half) } else { 0.0 };
        (prev + jitter).clamp(self.min, self.max)
    }
}

/// Per-field bounds of simulated telemetry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryWalk {
    pub buffer: WalkBounds,
    pub cpu: WalkBounds,
    pub ping: WalkBounds,
}

impl Default for TelemetryWalk {
    fn default() -> Self {
        Self {
            buffer: WalkBounds::new(20.0, 90.0, 10.0),
            cpu: WalkBounds::new(30.0, 85.0, 8.0),
            ping: WalkBounds::new(5.0, 50.0, 5.0),
        }
    }
}

impl TelemetryWalk {
    pub fn next<R: Rng>(&self, prev: &TelemetrySample, rng: &mut R) -> TelemetrySample {
        TelemetrySample {
            buffer: self.buffer.next(prev.buffer, rng),
            cpu: self.cpu.next(prev.cpu, rng),
            ping: self.ping.next(prev.ping, rng),
        }
    }
}

/// `GET /telemetry`, simulated when the backend is unreachable
pub struct TelemetrySource {
    backend: Arc<dyn ConsoleBackend>,
    walk: TelemetryWalk,
}

impl TelemetrySource {
    pub fn new(backend: Arc<dyn ConsoleBackend>) -> Self {
        Self {
            backend,
            walk: TelemetryWalk::default(),
        }
    }
}

#[async_trait]
impl PollSource<TelemetrySample> for TelemetrySource {
    fn name(&self) -> &str {
        "telemetry"
    }

    async fn fetch(&self) -> Result<TelemetrySample> {
        self.backend.telemetry().await
    }

    fn fallback(&self, previous: &TelemetrySample) -> TelemetrySample {
        self.walk.next(previous, &mut rand::thread_rng())
    }
}

/// `GET /events`; no events are fabricated, the last list is kept
pub struct EventLogSource {
    backend: Arc<dyn ConsoleBackend>,
}

impl EventLogSource {
    pub fn new(backend: Arc<dyn ConsoleBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl PollSource<Vec<SecurityEvent>> for EventLogSource {
    fn name(&self) -> &str {
        "events"
    }

    async fn fetch(&self) -> Result<Vec<SecurityEvent>> {
        self.backend.events().await
    }

    fn fallback(&self, previous: &Vec<SecurityEvent>) -> Vec<SecurityEvent> {
        previous.clone()
    }
}
