//! FeedController types

use crate::models::{AnalysisReport, Camera};
use serde::{Deserialize, Serialize};

/// Stream connection of a mounted feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connection {
    /// Stream mounted and loading
    Online,
    /// Camera configured offline, nothing mounted
    Offline,
    /// Stream failed to load; only a remount recovers
    Error,
}

/// AI analysis lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "result", rename_all = "snake_case")]
pub enum AnalysisState {
    Idle,
    Running,
    Succeeded(AnalysisReport),
    Failed,
}

impl AnalysisState {
    pub fn is_running(&self) -> bool {
        matches!(self, AnalysisState::Running)
    }
}

/// Observable state of one camera feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedState {
    pub camera_id: String,
    pub camera_name: String,
    pub connection: Connection,
    pub recording: bool,
    pub recording_seconds: u64,
    pub fullscreen: bool,
    pub analysis: AnalysisState,
}

impl FeedState {
    pub fn for_camera(camera: &Camera) -> Self {
        Self {
            camera_id: camera.camera_id.clone(),
            camera_name: camera.name.clone(),
            connection: if camera.online {
                Connection::Online
            } else {
                Connection::Offline
            },
            recording: false,
            recording_seconds: 0,
            fullscreen: false,
            analysis: AnalysisState::Idle,
        }
    }

    /// Whether frames can be captured
    pub fn is_healthy(&self) -> bool {
        self.connection == Connection::Online
    }

    /// Recording badge text, `REC MM:SS`
    pub fn recording_label(&self) -> Option<String> {
        self.recording
            .then(|| format!("REC {}", crate::models::format_clock(self.recording_seconds)))
    }
}
