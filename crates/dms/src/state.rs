//! Driver state tracking

use alerting::{AlertKind, Severity};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Driver alertness classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionState {
    #[default]
    Awake,
    Drowsy,
    Sleeping,
}

impl DetectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Awake => "awake",
            Self::Drowsy => "drowsy",
            Self::Sleeping => "sleeping",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Awake => Severity::None,
            Self::Drowsy => Severity::Moderate,
            Self::Sleeping => Severity::Severe,
        }
    }

    /// Alert to sound when entering this state
    pub fn alert_kind(&self) -> Option<AlertKind> {
        match self {
            Self::Awake => None,
            Self::Drowsy => Some(AlertKind::Drowsy),
            Self::Sleeping => Some(AlertKind::Sleeping),
        }
    }
}

impl std::fmt::Display for DetectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-session classifier counters.
///
/// At most one counter is non-zero. `current` only changes through the
/// classifier, from the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifierState {
    pub(crate) closed_frames: u32,
    pub(crate) drowsy_frames: u32,
    pub(crate) current: DetectionState,
}

impl ClassifierState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consecutive frames with eyes closed
    pub fn closed_frames(&self) -> u32 {
        self.closed_frames
    }

    /// Consecutive frames with eyes partially closed
    pub fn drowsy_frames(&self) -> u32 {
        self.drowsy_frames
    }

    pub fn current(&self) -> DetectionState {
        self.current
    }

    /// Back to Awake with empty counters (on session stop or driver change)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Emitted when the classification changes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateChangeEvent {
    pub previous: DetectionState,
    pub new: DetectionState,
    /// EAR of the frame that caused the change
    pub ear: f32,
    /// Monotonic time of that frame
    pub timestamp: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_severity() {
        assert_eq!(DetectionState::Awake.severity(), Severity::None);
        assert_eq!(DetectionState::Drowsy.severity(), Severity::Moderate);
        assert_eq!(DetectionState::Sleeping.severity(), Severity::Severe);
        assert_eq!(DetectionState::Awake.alert_kind(), None);
        assert_eq!(DetectionState::Sleeping.alert_kind(), Some(AlertKind::Sleeping));
    }

    #[test]
    fn test_reset() {
        let mut state = ClassifierState {
            closed_frames: 12,
            drowsy_frames: 0,
            current: DetectionState::Sleeping,
        };
        state.reset();

        assert_eq!(state, ClassifierState::new());
        assert_eq!(state.current(), DetectionState::Awake);
    }
}
