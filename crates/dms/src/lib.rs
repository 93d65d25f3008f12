//! Driver Monitoring System (DMS)
//!
//! Real-time driver drowsiness classification from facial landmarks:
//! - Eye aspect ratio (EAR) from face-mesh eye landmarks
//! - Frame-count hysteresis into awake / drowsy / sleeping
//! - Unthrottled driver alerts on every state change
//! - Throttled, fire-and-forget persistence of drowsiness events

pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod ear;
pub mod landmarks;
pub mod session;
pub mod source;
pub mod state;

pub use classifier::{Classification, ClassifierThresholds, HysteresisClassifier};
pub use config::DmsConfig;
pub use dispatch::{AlertDispatcher, DispatchOutcome, Persistence};
pub use ear::{eye_aspect_ratio, try_eye_aspect_ratio, EarReading, FALLBACK_EAR};
pub use landmarks::{eye_indices, EyeLandmarks, IndexPair, LandmarkFrame, Point2};
pub use session::{DetectionSession, SessionStats, SharedSession};
pub use source::{LandmarkEvent, LandmarkSource, ReplaySource};
pub use state::{ClassifierState, DetectionState, StateChangeEvent};

use thiserror::Error;

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(String),

    #[error("Landmark {0} missing from frame")]
    KeypointsMissing(usize),

    #[error("Malformed landmark frame: {0}")]
    MalformedFrame(String),

    #[error("Session lock poisoned: {0}")]
    LockPoisoned(String),
}
