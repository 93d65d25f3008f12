//! DMS configuration

use crate::classifier::ClassifierThresholds;
use crate::DmsError;
use alerting::ThrottleConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// DMS configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmsConfig {
    /// Vehicle identifier attached to persisted events
    pub vehicle_id: String,

    /// Confidence reported with persisted events
    pub confidence: f64,

    /// EAR thresholds and run lengths
    pub thresholds: ClassifierThresholds,

    /// Minimum spacing between persisted events
    pub throttle: ThrottleConfig,

    /// Landmark source frame rate. When set, run lengths are rescaled
    /// from the 30 fps they are calibrated for.
    #[serde(default)]
    pub fps: Option<f32>,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            vehicle_id: "unknown".to_string(),
            confidence: 0.9,
            thresholds: ClassifierThresholds::default(),
            throttle: ThrottleConfig::default(),
            fps: None,
        }
    }
}

impl DmsConfig {
    /// Load configuration from defaults, an optional file, and the environment.
    ///
    /// Environment variables use the `DMS__` prefix with `__` between
    /// sections, e.g. `DMS__VEHICLE_ID` or `DMS__THRESHOLDS__CLOSED_EAR`.
    pub fn load(path: Option<&Path>) -> Result<Self, DmsError> {
        let defaults = Config::try_from(&Self::default())
            .map_err(|e| DmsError::Config(e.to_string()))?;

        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            info!("Loading DMS configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("DMS")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| DmsError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Thresholds with run lengths adjusted to `fps`, if configured
    pub fn effective_thresholds(&self) -> ClassifierThresholds {
        match self.fps {
            Some(fps) => self.thresholds.scaled_to_fps(fps),
            None => self.thresholds.clone(),
        }
    }

    /// Reject settings the classifier cannot work with
    pub fn validate(&self) -> Result<(), DmsError> {
        let t = &self.thresholds;

        if self.vehicle_id.trim().is_empty() {
            return Err(DmsError::Config("vehicle_id must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(DmsError::Config(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        if !(t.closed_ear > 0.0 && t.closed_ear < t.drowsy_ear) {
            return Err(DmsError::InvalidThresholds(format!(
                "need 0 < closed_ear ({}) < drowsy_ear ({})",
                t.closed_ear, t.drowsy_ear
            )));
        }
        if let Some(fps) = self.fps {
            if !(fps.is_finite() && fps > 0.0) {
                return Err(DmsError::Config(format!("fps {} must be positive", fps)));
            }
        }
        if t.sleeping_frames == 0 || t.drowsy_frames == 0 {
            return Err(DmsError::InvalidThresholds(
                "frame counts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
