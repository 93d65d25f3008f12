//! Alert kinds, tone patterns, and the sink that delivers them

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    None,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

/// Which audible alert to sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Driver is drifting into drowsiness
    Drowsy,
    /// Driver's eyes have stayed shut
    Sleeping,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drowsy => "drowsy",
            Self::Sleeping => "sleeping",
        }
    }

    /// Tone pattern the audio collaborator should synthesize
    pub fn tone(&self) -> TonePattern {
        match self {
            // Three short pulses
            Self::Drowsy => TonePattern {
                frequency_hz: 800,
                pulse_ms: 150,
                pulses: 3,
                spacing_ms: 200,
            },
            // One long, higher tone
            Self::Sleeping => TonePattern {
                frequency_hz: 1000,
                pulse_ms: 1000,
                pulses: 1,
                spacing_ms: 0,
            },
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Drowsy => Severity::Moderate,
            Self::Sleeping => Severity::Severe,
        }
    }
}

/// Description of an alert tone. Synthesis happens elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TonePattern {
    /// Tone frequency (Hz)
    pub frequency_hz: u32,
    /// Length of each pulse (ms)
    pub pulse_ms: u64,
    /// Number of pulses
    pub pulses: u32,
    /// Start-to-start distance between pulses (ms)
    pub spacing_ms: u64,
}

impl TonePattern {
    /// Offset of each pulse from the start of the pattern
    pub fn pulse_offsets(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.pulses as u64).map(move |i| Duration::from_millis(i * self.spacing_ms))
    }

    /// Time from the first pulse starting to the last pulse ending
    pub fn total_duration(&self) -> Duration {
        if self.pulses == 0 {
            return Duration::ZERO;
        }
        let last_start = (self.pulses as u64 - 1) * self.spacing_ms;
        Duration::from_millis(last_start + self.pulse_ms)
    }
}

/// Destination for driver-facing alerts (audio and on-screen notice).
///
/// Implementations must return promptly; delivery failures are theirs to handle.
pub trait AlertSink: Send + Sync {
    /// Sound the tone for `kind`
    fn play_alert(&self, kind: AlertKind);

    /// Show a notice to the driver
    fn notify(&self, message: &str, severity: Severity);
}

impl<S: AlertSink + ?Sized> AlertSink for Arc<S> {
    fn play_alert(&self, kind: AlertKind) {
        (**self).play_alert(kind)
    }

    fn notify(&self, message: &str, severity: Severity) {
        (**self).notify(message, severity)
    }
}

/// Sink that writes every alert to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AlertSink for TracingSink {
    fn play_alert(&self, kind: AlertKind) {
        let tone = kind.tone();
        warn!(
            kind = kind.as_str(),
            frequency_hz = tone.frequency_hz,
            pulses = tone.pulses,
            duration_ms = tone.total_duration().as_millis() as u64,
            "Playing alert tone"
        );
    }

    fn notify(&self, message: &str, severity: Severity) {
        info!(severity = severity.as_str(), "Driver notice: {}", message);
    }
}

/// A call received by a [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Alert(AlertKind),
    Notice { message: String, severity: Severity },
}

/// Sink that keeps every call in memory, in order
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Alert kinds played so far
    pub fn alerts(&self) -> Vec<AlertKind> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::Alert(kind) => Some(kind),
                SinkCall::Notice { .. } => None,
            })
            .collect()
    }

    fn push(&self, call: SinkCall) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }
}

impl AlertSink for RecordingSink {
    fn play_alert(&self, kind: AlertKind) {
        self.push(SinkCall::Alert(kind));
    }

    fn notify(&self, message: &str, severity: Severity) {
        self.push(SinkCall::Notice {
            message: message.to_string(),
            severity,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drowsy_tone_is_three_spaced_pulses() {
        let tone = AlertKind::Drowsy.tone();
        let offsets: Vec<_> = tone.pulse_offsets().collect();

        assert_eq!(
            offsets,
            vec![
                Duration::ZERO,
                Duration::from_millis(200),
                Duration::from_millis(400)
            ]
        );
        assert_eq!(tone.total_duration(), Duration::from_millis(550));
    }

    #[test]
    fn test_sleeping_tone_is_longer_and_higher() {
        let drowsy = AlertKind::Drowsy.tone();
        let sleeping = AlertKind::Sleeping.tone();

        assert_eq!(sleeping.pulses, 1);
        assert!(sleeping.frequency_hz > drowsy.frequency_hz);
        assert!(sleeping.pulse_ms > drowsy.pulse_ms);
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(AlertKind::Drowsy.severity(), Severity::Moderate);
        assert_eq!(AlertKind::Sleeping.severity(), Severity::Severe);
        assert!(Severity::Severe > Severity::Moderate);
        assert_eq!(Severity::None.as_str(), "none");
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.play_alert(AlertKind::Sleeping);
        sink.notify("wake up", Severity::Severe);

        assert_eq!(
            sink.calls(),
            vec![
                SinkCall::Alert(AlertKind::Sleeping),
                SinkCall::Notice {
                    message: "wake up".to_string(),
                    severity: Severity::Severe,
                },
            ]
        );
        assert_eq!(sink.alerts(), vec![AlertKind::Sleeping]);
    }
}
