//! Frame-count hysteresis classifier

use crate::state::{ClassifierState, DetectionState, StateChangeEvent};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, trace};

/// EAR thresholds and run lengths.
///
/// Run lengths assume a landmark source near 30 fps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    /// Below this, eyes count as closed
    pub closed_ear: f32,
    /// Below this (and at or above `closed_ear`), eyes count as half-closed
    pub drowsy_ear: f32,
    /// Consecutive closed frames before Sleeping (~0.7 s)
    pub sleeping_frames: u32,
    /// Consecutive half-closed frames before Drowsy (~1 s)
    pub drowsy_frames: u32,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            closed_ear: 0.15,
            drowsy_ear: 0.20,
            sleeping_frames: 22,
            drowsy_frames: 30,
        }
    }
}

impl ClassifierThresholds {
    /// Frame rate the default run lengths are calibrated for
    pub const REFERENCE_FPS: f32 = 30.0;

    /// Same closure durations, expressed in frames at `fps`
    pub fn scaled_to_fps(&self, fps: f32) -> Self {
        let scale = |frames: u32| -> u32 {
            if !fps.is_finite() || fps <= 0.0 {
                return frames;
            }
            ((frames as f32 * fps / Self::REFERENCE_FPS).round() as u32).max(1)
        };
        Self {
            sleeping_frames: scale(self.sleeping_frames),
            drowsy_frames: scale(self.drowsy_frames),
            ..self.clone()
        }
    }
}

/// Result of classifying one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// State after this frame
    pub state: DetectionState,
    /// Set only when `state` differs from the state before this frame
    pub change: Option<StateChangeEvent>,
}

/// Turns a stream of EAR samples into Awake / Drowsy / Sleeping.
///
/// Any frame outside a bucket breaks that bucket's run, so intermittent
/// closures never add up to a state change.
#[derive(Debug, Clone, Default)]
pub struct HysteresisClassifier {
    thresholds: ClassifierThresholds,
}

impl HysteresisClassifier {
    pub fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    /// Classify one frame. Must be called once per frame, in frame order.
    pub fn classify(
        &self,
        ear: f32,
        state: &mut ClassifierState,
        timestamp: Duration,
    ) -> Classification {
        let t = &self.thresholds;

        if ear < t.closed_ear {
            state.closed_frames = state.closed_frames.saturating_add(1);
            state.drowsy_frames = 0;
        } else if ear < t.drowsy_ear {
            state.drowsy_frames = state.drowsy_frames.saturating_add(1);
            state.closed_frames = 0;
        } else {
            // Also reached by NaN
            state.closed_frames = 0;
            state.drowsy_frames = 0;
        }

        let candidate = if state.closed_frames >= t.sleeping_frames {
            DetectionState::Sleeping
        } else if state.drowsy_frames >= t.drowsy_frames {
            DetectionState::Drowsy
        } else {
            DetectionState::Awake
        };

        trace!(
            ear,
            closed = state.closed_frames,
            drowsy = state.drowsy_frames,
            "Frame classified as {}",
            candidate
        );

        if candidate == state.current {
            return Classification {
                state: candidate,
                change: None,
            };
        }

        let previous = state.current;
        state.current = candidate;
        info!("Driver state changed: {} -> {} (EAR {:.3})", previous, candidate, ear);

        Classification {
            state: candidate,
            change: Some(StateChangeEvent {
                previous,
                new: candidate,
                ear,
                timestamp,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn feed(
        classifier: &HysteresisClassifier,
        state: &mut ClassifierState,
        ear: f32,
        frames: u32,
    ) -> Vec<StateChangeEvent> {
        (0..frames)
            .filter_map(|_| classifier.classify(ear, state, Duration::ZERO).change)
            .collect()
    }

    #[test]
    fn test_sleeping_on_exactly_22nd_frame() {
        let classifier = HysteresisClassifier::default();
        let mut state = ClassifierState::new();

        assert!(feed(&classifier, &mut state, 0.10, 21).is_empty());
        assert_eq!(state.current(), DetectionState::Awake);
        assert_eq!(state.closed_frames(), 21);

        let result = classifier.classify(0.10, &mut state, Duration::from_millis(700));
        assert_eq!(result.state, DetectionState::Sleeping);
        assert_eq!(
            result.change,
            Some(StateChangeEvent {
                previous: DetectionState::Awake,
                new: DetectionState::Sleeping,
                ear: 0.10,
                timestamp: Duration::from_millis(700),
            })
        );
    }

    #[test]
    fn test_single_open_frame_breaks_closed_run() {
        let classifier = HysteresisClassifier::default();
        let mut state = ClassifierState::new();

        feed(&classifier, &mut state, 0.10, 21);
        let result = classifier.classify(0.20, &mut state, Duration::ZERO);

        assert_eq!(state.closed_frames(), 0);
        assert_eq!(result.state, DetectionState::Awake);
        assert!(feed(&classifier, &mut state, 0.10, 21).is_empty());
    }

    #[test]
    fn test_drowsy_on_30th_frame() {
        let classifier = HysteresisClassifier::default();
        let mut state = ClassifierState::new();

        assert!(feed(&classifier, &mut state, 0.17, 29).is_empty());
        let events = feed(&classifier, &mut state, 0.17, 1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].new, DetectionState::Drowsy);
    }

    #[test]
    fn test_interruption_resets_drowsy_run() {
        let classifier = HysteresisClassifier::default();

        for split in [1, 15, 29] {
            let mut state = ClassifierState::new();
            feed(&classifier, &mut state, 0.18, split);
            feed(&classifier, &mut state, 0.25, 1);
            assert_eq!(state.drowsy_frames(), 0);

            assert!(feed(&classifier, &mut state, 0.18, 29).is_empty());
            assert_eq!(feed(&classifier, &mut state, 0.18, 1).len(), 1);
        }
    }

    #[test]
    fn test_threshold_boundaries() {
        let classifier = HysteresisClassifier::default();
        let mut state = ClassifierState::new();

        classifier.classify(0.15, &mut state, Duration::ZERO);
        assert_eq!((state.closed_frames(), state.drowsy_frames()), (0, 1));

        classifier.classify(0.149, &mut state, Duration::ZERO);
        assert_eq!((state.closed_frames(), state.drowsy_frames()), (1, 0));

        classifier.classify(0.20, &mut state, Duration::ZERO);
        assert_eq!((state.closed_frames(), state.drowsy_frames()), (0, 0));
    }

    #[test]
    fn test_sleeping_straight_to_awake() {
        let classifier = HysteresisClassifier::default();
        let mut state = ClassifierState::new();
        feed(&classifier, &mut state, 0.05, 22);

        let events = feed(&classifier, &mut state, 0.30, 1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].previous, DetectionState::Sleeping);
        assert_eq!(events[0].new, DetectionState::Awake);
    }

    #[test]
    fn test_oscillation_below_drowsy_never_reemits() {
        let classifier = HysteresisClassifier::default();
        let mut state = ClassifierState::new();
        feed(&classifier, &mut state, 0.17, 30);
        assert_eq!(state.current(), DetectionState::Drowsy);

        // Staying in the drowsy band keeps the run going; no new events
        assert!(feed(&classifier, &mut state, 0.19, 100).is_empty());
        assert_eq!(state.current(), DetectionState::Drowsy);
    }

    #[test]
    fn test_nan_counts_as_open() {
        let classifier = HysteresisClassifier::default();
        let mut state = ClassifierState::new();
        feed(&classifier, &mut state, 0.10, 10);
        classifier.classify(f32::NAN, &mut state, Duration::ZERO);

        assert_eq!(state.closed_frames(), 0);
        assert_eq!(state.drowsy_frames(), 0);
    }

    #[test]
    fn test_thresholds_scaled_to_fps() {
        let base = ClassifierThresholds::default();

        assert_eq!(base.scaled_to_fps(30.0), base);
        let slow = base.scaled_to_fps(15.0);
        assert_eq!((slow.sleeping_frames, slow.drowsy_frames), (11, 15));
        assert_eq!(slow.closed_ear, base.closed_ear);
        assert_eq!(base.scaled_to_fps(0.0), base);
    }

    proptest! {
        #[test]
        fn prop_counters_mutually_exclusive(ears in prop::collection::vec(0.0f32..0.5, 0..400)) {
            let classifier = HysteresisClassifier::default();
            let mut state = ClassifierState::new();

            for ear in ears {
                let before = state.current();
                let result = classifier.classify(ear, &mut state, Duration::ZERO);

                prop_assert!(state.closed_frames() == 0 || state.drowsy_frames() == 0);
                prop_assert_eq!(result.state, state.current());
                prop_assert_eq!(result.change.is_some(), before != result.state);
            }
        }

        #[test]
        fn prop_events_alternate_states(ears in prop::collection::vec(0.0f32..0.3, 0..600)) {
            let classifier = HysteresisClassifier::default();
            let mut state = ClassifierState::new();
            let mut last = DetectionState::Awake;

            for ear in ears {
                if let Some(event) = classifier.classify(ear, &mut state, Duration::ZERO).change {
                    prop_assert_eq!(event.previous, last);
                    prop_assert_ne!(event.new, last);
                    last = event.new;
                }
            }
        }
    }
}
