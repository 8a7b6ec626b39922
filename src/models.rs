//! Shared models and types for SafeSight Console
//!
//! This module contains types shared across multiple modules
//! to avoid circular dependencies.

use serde::{Deserialize, Deserializer, Serialize};

/// Authenticated operator (matches backend `/auth/me` response)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl User {
    /// Name shown in the operator profile
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }
}

fn default_true() -> bool {
    true
}

/// Backend ids are integers, older fixtures use strings
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// Token response from `/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Error body returned by the backend on 4xx
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Sidebar telemetry sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Stream buffer fill (0-100)
    pub buffer: f64,
    /// Backend CPU load (0-100)
    pub cpu: f64,
    /// Round trip in ms (0-50)
    pub ping: f64,
}

impl Default for TelemetrySample {
    fn default() -> Self {
        Self {
            buffer: 45.0,
            cpu: 62.0,
            ping: 12.0,
        }
    }
}

/// Security event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Entry of the sidebar event log (most recent first)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: String,
    pub timestamp: String,
    pub message: String,
    pub severity: Severity,
}

impl SecurityEvent {
    fn seed(id: &str, timestamp: &str, message: &str, severity: Severity) -> Self {
        Self {
            id: id.to_string(),
            timestamp: timestamp.to_string(),
            message: message.to_string(),
            severity,
        }
    }

    /// Event log shown before the first successful poll
    pub fn seed_log() -> Vec<SecurityEvent> {
        vec![
            Self::seed("1", "14:32:15", "Motion detected in Zone A", Severity::Low),
            Self::seed("2", "14:28:42", "Face recognition: Unknown person", Severity::Medium),
            Self::seed("3", "14:25:18", "Weapon detected in Zone C", Severity::Critical),
            Self::seed("4", "14:20:05", "System backup completed", Severity::Low),
        ]
    }
}

/// Object class counted by the analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    #[serde(rename = "type")]
    pub object_type: String,
    pub count: u32,
    pub confidence: f64,
}

/// Threat check performed by the analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatFinding {
    #[serde(rename = "type")]
    pub threat_type: String,
    pub detected: bool,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Response of `POST /analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub threat_level: String,
    pub summary: String,
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
    #[serde(default)]
    pub threats: Vec<ThreatFinding>,
}

/// Request body of `POST /analyze`
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    pub camera_id: String,
    /// JPEG frame as a `data:` URL
    pub image: String,
}

/// Display priority of a camera tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
}

/// Camera roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub camera_id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub online: bool,
    #[serde(default)]
    pub priority: Priority,
}

impl Camera {
    pub fn new(camera_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            camera_id: camera_id.into(),
            name: name.into(),
            online: true,
            priority: Priority::Normal,
        }
    }

    /// Default control-center roster
    pub fn default_roster() -> Vec<Camera> {
        let mut primary = Camera::new("1", "Primary Monitoring Channel");
        primary.priority = Priority::High;

        let mut roster = vec![primary];
        roster.extend(
            [
                "Camera 02 - Back Entrance",
                "Camera 03 - Parking Lot",
                "Camera 04 - Main Hall",
                "Camera 05 - Side Entrance",
                "Camera 06 - Loading Dock",
                "Camera 07 - Perimeter North",
            ]
            .iter()
            .enumerate()
            .map(|(i, name)| Camera::new((i + 2).to_string(), *name)),
        );
        roster
    }
}

/// Toast level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User-visible notice emitted by feed actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub camera_id: String,
    pub level: NoticeLevel,
    pub message: String,
}

/// Format seconds as `MM:SS`
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Format seconds as `HH:MM:SS`
pub fn format_session_clock(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_numeric_id() {
        let user: User = serde_json::from_str(
            r#"{"id": 7, "username": "admin", "email": "a@b.c", "full_name": null, "role": "admin"}"#,
        )
        .unwrap();
        assert_eq!(user.id, "7");
        assert!(user.is_active);
        assert_eq!(user.display_name(), "admin");
    }

    #[test]
    fn test_analysis_report_wire_names() {
        let report: AnalysisReport = serde_json::from_str(
            r#"{
                "threatLevel": "medium",
                "summary": "One person loitering",
                "objects": [{"type": "person", "count": 1, "confidence": 0.91}],
                "threats": [{"type": "weapon", "detected": false, "confidence": 0.12}]
            }"#,
        )
        .unwrap();
        assert_eq!(report.threat_level, "medium");
        assert_eq!(report.objects[0].object_type, "person");
        assert!(report.threats[0].description.is_none());

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("threatLevel"));
        assert!(!json.contains("description"));
    }

    #[test]
    fn test_default_roster() {
        let roster = Camera::default_roster();
        assert_eq!(roster.len(), 7);
        assert_eq!(roster[0].priority, Priority::High);
        assert_eq!(roster[6].camera_id, "7");
        assert_eq!(roster[6].name, "Camera 07 - Perimeter North");
    }

    #[test]
    fn test_clocks() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(125), "02:05");
        assert_eq!(format_session_clock(3725), "01:02:05");
    }

    #[test]
    fn test_severity_parse() {
        let event: SecurityEvent = serde_json::from_str(
            r#"{"id": "9", "timestamp": "10:00:00", "message": "Door forced", "severity": "high"}"#,
        )
        .unwrap();
        assert_eq!(event.severity, Severity::High);
        assert_eq!(event.severity.as_str(), "high");
    }
}
