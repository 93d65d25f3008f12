//! Detection session lifecycle

use crate::classifier::HysteresisClassifier;
use crate::config::DmsConfig;
use crate::dispatch::{AlertDispatcher, Persistence};
use crate::ear::eye_aspect_ratio;
use crate::source::{LandmarkEvent, LandmarkSource};
use crate::state::{ClassifierState, DetectionState, StateChangeEvent};
use crate::DmsError;
use alerting::{AlertSink, Clock};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use storage::EventSink;
use tracing::{debug, info};

type DetectionCallback = Box<dyn FnMut(DetectionState, f32) + Send>;

/// Counters for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Frames that reached the classifier
    pub frames_processed: u64,
    /// Frames with no face
    pub faces_missing: u64,
    pub state_changes: u64,
    pub alerts_raised: u64,
    pub events_persisted: u64,
    pub events_throttled: u64,
}

/// One monitoring session: classifier state plus alert dispatch.
///
/// Frames are processed to completion one at a time through `&mut self`.
/// Wrap in [`SharedSession`] when frames may arrive from several threads.
pub struct DetectionSession<S: AlertSink, C: Clock> {
    classifier: HysteresisClassifier,
    state: ClassifierState,
    dispatcher: AlertDispatcher<S>,
    clock: C,
    on_detection: Option<DetectionCallback>,
    active: bool,
    stats: SessionStats,
}

impl<S: AlertSink, C: Clock> DetectionSession<S, C> {
    /// Create a stopped session
    pub fn new(
        config: &DmsConfig,
        sink: S,
        events: Box<dyn EventSink>,
        clock: C,
    ) -> Result<Self, DmsError> {
        config.validate()?;

        Ok(Self {
            classifier: HysteresisClassifier::new(config.effective_thresholds()),
            state: ClassifierState::new(),
            dispatcher: AlertDispatcher::new(
                sink,
                events,
                config.throttle.clone(),
                config.vehicle_id.clone(),
                config.confidence,
            ),
            clock,
            on_detection: None,
            active: false,
            stats: SessionStats::default(),
        })
    }

    /// Register the state-change callback, replacing any previous one
    pub fn on_detection(&mut self, callback: impl FnMut(DetectionState, f32) + Send + 'static) {
        self.on_detection = Some(Box::new(callback));
    }

    /// Begin accepting frames
    pub fn start(&mut self) {
        if self.active {
            return;
        }
        info!("Detection session started");
        self.stats = SessionStats::default();
        self.active = true;
    }

    /// Stop accepting frames and reset classifier and throttle state
    pub fn stop(&mut self) {
        if self.active {
            info!(
                frames = self.stats.frames_processed,
                changes = self.stats.state_changes,
                "Detection session stopped"
            );
        }
        self.active = false;
        self.state.reset();
        self.dispatcher.reset();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Handle one event from the landmark source.
    ///
    /// Face-not-found leaves counters and state untouched.
    pub fn process(&mut self, event: LandmarkEvent) -> Option<StateChangeEvent> {
        if !self.active {
            debug!("Ignoring landmark event on stopped session");
            return None;
        }

        match event {
            LandmarkEvent::Frame(frame) => self.process_ear(eye_aspect_ratio(&frame)),
            LandmarkEvent::FaceNotFound => {
                self.stats.faces_missing += 1;
                None
            }
        }
    }

    /// Handle one frame whose EAR was computed elsewhere
    pub fn process_ear(&mut self, ear: f32) -> Option<StateChangeEvent> {
        if !self.active {
            return None;
        }
        self.stats.frames_processed += 1;

        let now = self.clock.now();
        let change = self.classifier.classify(ear, &mut self.state, now).change?;
        self.stats.state_changes += 1;

        if let Some(callback) = self.on_detection.as_mut() {
            callback(change.new, change.ear);
        }

        let outcome = self.dispatcher.dispatch(&change);
        if outcome.alert.is_some() {
            self.stats.alerts_raised += 1;
        }
        match outcome.persistence {
            Persistence::Submitted => self.stats.events_persisted += 1,
            Persistence::Throttled => self.stats.events_throttled += 1,
            Persistence::Skipped => {}
        }

        Some(change)
    }

    /// Drain `source` through this session, starting it if needed.
    ///
    /// The session stays active afterwards; call [`stop`](Self::stop) to end it.
    pub fn run<L: LandmarkSource + ?Sized>(&mut self, source: &mut L) -> SessionStats {
        self.start();
        while let Some(event) = source.next_event() {
            self.process(event);
        }
        self.stats.clone()
    }

    pub fn current_state(&self) -> DetectionState {
        self.state.current()
    }

    pub fn classifier_state(&self) -> &ClassifierState {
        &self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn dispatcher(&self) -> &AlertDispatcher<S> {
        &self.dispatcher
    }
}

/// A session behind a mutex, for hosts that cannot serialize frames
pub struct SharedSession<S: AlertSink, C: Clock> {
    inner: Arc<Mutex<DetectionSession<S, C>>>,
}

impl<S: AlertSink, C: Clock> Clone for SharedSession<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: AlertSink, C: Clock> SharedSession<S, C> {
    pub fn new(session: DetectionSession<S, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn process(&self, event: LandmarkEvent) -> Result<Option<StateChangeEvent>, DmsError> {
        Ok(self.lock()?.process(event))
    }

    pub fn process_ear(&self, ear: f32) -> Result<Option<StateChangeEvent>, DmsError> {
        Ok(self.lock()?.process_ear(ear))
    }

    /// Register the state-change callback, replacing any previous one
    pub fn on_detection(
        &self,
        callback: impl FnMut(DetectionState, f32) + Send + 'static,
    ) -> Result<(), DmsError> {
        self.lock()?.on_detection(callback);
        Ok(())
    }

    pub fn start(&self) -> Result<(), DmsError> {
        self.lock()?.start();
        Ok(())
    }

    pub fn stop(&self) -> Result<(), DmsError> {
        self.lock()?.stop();
        Ok(())
    }

    pub fn current_state(&self) -> Result<DetectionState, DmsError> {
        Ok(self.lock()?.current_state())
    }

    pub fn stats(&self) -> Result<SessionStats, DmsError> {
        Ok(self.lock()?.stats().clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, DetectionSession<S, C>>, DmsError> {
        self.inner
            .lock()
            .map_err(|e| DmsError::LockPoisoned(e.to_string()))
    }
}
