//! Alert dispatch on state changes

use crate::state::{DetectionState, StateChangeEvent};
use alerting::{AlertKind, AlertSink, EmitThrottle, Severity, ThrottleConfig};
use storage::{DrowsinessLevel, DrowsinessRecord, EventSink};
use tracing::{info, warn};

const DROWSY_NOTICE: &str = "Drowsiness detected. Consider taking a break.";
const SLEEPING_NOTICE: &str = "Wake up! Your eyes have been closed too long.";

/// What happened to persistence for one state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// Record handed to the event sink
    Submitted,
    /// Suppressed by the throttle
    Throttled,
    /// Nothing to persist (back to Awake)
    Skipped,
}

/// Side effects issued for one state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub severity: Severity,
    pub alert: Option<AlertKind>,
    pub persistence: Persistence,
}

/// Turns state changes into driver alerts and persisted events.
///
/// Alerts are never throttled. Persistence is limited to one record per
/// throttle interval, measured on the event timestamps.
pub struct AlertDispatcher<S: AlertSink> {
    sink: S,
    events: Box<dyn EventSink>,
    throttle: EmitThrottle,
    vehicle_id: String,
    confidence: f64,
}

impl<S: AlertSink> AlertDispatcher<S> {
    pub fn new(
        sink: S,
        events: Box<dyn EventSink>,
        throttle: ThrottleConfig,
        vehicle_id: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            sink,
            events,
            throttle: EmitThrottle::new(throttle),
            vehicle_id: vehicle_id.into(),
            confidence,
        }
    }

    /// Issue the side effects for one state change
    pub fn dispatch(&mut self, event: &StateChangeEvent) -> DispatchOutcome {
        let severity = event.new.severity();
        let alert = event.new.alert_kind();

        if let Some(kind) = alert {
            warn!(
                kind = kind.as_str(),
                ear = event.ear,
                "Driver alert: {} -> {}",
                event.previous,
                event.new
            );
            self.sink.play_alert(kind);
            self.sink.notify(notice_for(kind), severity);
        } else {
            info!("Driver back to {}", event.new);
        }

        let persistence = match persisted_level(event.new) {
            None => Persistence::Skipped,
            Some(level) => {
                if self.throttle.try_emit(event.timestamp) {
                    self.events.submit(DrowsinessRecord {
                        vehicle_id: self.vehicle_id.clone(),
                        drowsiness_level: level,
                        confidence: self.confidence,
                        eye_aspect_ratio: f64::from(event.ear),
                        // Only sleeping transitions are flagged as alerted
                        alert_triggered: event.new == DetectionState::Sleeping,
                    });
                    Persistence::Submitted
                } else {
                    Persistence::Throttled
                }
            }
        };

        DispatchOutcome {
            severity,
            alert,
            persistence,
        }
    }

    /// Clear the throttle so the next session starts unthrottled
    pub fn reset(&mut self) {
        self.throttle.reset();
    }

    pub fn throttle(&self) -> &EmitThrottle {
        &self.throttle
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

fn persisted_level(state: DetectionState) -> Option<DrowsinessLevel> {
    match state {
        DetectionState::Awake => None,
        DetectionState::Drowsy => Some(DrowsinessLevel::Moderate),
        DetectionState::Sleeping => Some(DrowsinessLevel::Severe),
    }
}

fn notice_for(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Drowsy => DROWSY_NOTICE,
        AlertKind::Sleeping => SLEEPING_NOTICE,
    }
}
