//! SafeSight Console Library
//!
//! Operator console core for the SafeSight camera dashboard
//!
//! ## Architecture (7 Components)
//!
//! 1. ConsoleApi - Backend REST adapter (auth, telemetry, events, analysis)
//! 2. FrameGrabber - MJPEG stream probe and frame capture
//! 3. SessionStore - Token persistence, identity validation, cross-instance sync
//! 4. PollingController - Interval fetch with silent fallback
//! 5. FeedController - Per-camera stream, recording, snapshot and analysis state
//! 6. SidebarAggregator - Navigation, telemetry, event log, session clock
//! 7. Dashboard - Authenticated composition of feeds and sidebar
//!
//! ## Design Principles
//!
//! - State lives in watch channels; every mutation is atomic
//! - Every spawned task is owned by a cancellation token released on drop
//! - Every network call carries an explicit timeout

pub mod console_api;
pub mod dashboard;
pub mod error;
pub mod feed_controller;
pub mod frame_grabber;
pub mod models;
pub mod polling_controller;
pub mod session_store;
pub mod sidebar;
pub mod state;

#[cfg(test)]
mod test_helpers;

pub use error::{Error, Result};
pub use state::{ConsoleConfig, ConsoleState};
