//! Landmark sources

use crate::landmarks::LandmarkFrame;
use serde::{Deserialize, Serialize};

/// One result from the landmark inference stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LandmarkEvent {
    /// A face was found
    Frame(LandmarkFrame),
    /// No face in this frame
    FaceNotFound,
}

impl From<LandmarkFrame> for LandmarkEvent {
    fn from(frame: LandmarkFrame) -> Self {
        Self::Frame(frame)
    }
}

impl From<Option<LandmarkFrame>> for LandmarkEvent {
    fn from(frame: Option<LandmarkFrame>) -> Self {
        frame.map_or(Self::FaceNotFound, Self::Frame)
    }
}

/// Produces landmark events one at a time.
///
/// A source is finite per session (`next_event` returns `None` when it
/// is exhausted) and can be restarted for the next session.
pub trait LandmarkSource {
    fn next_event(&mut self) -> Option<LandmarkEvent>;

    /// Rewind for a new session
    fn restart(&mut self);
}

/// In-memory source that replays a fixed sequence of events
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    events: Vec<LandmarkEvent>,
    position: usize,
}

impl ReplaySource {
    pub fn new(events: Vec<LandmarkEvent>) -> Self {
        Self {
            events,
            position: 0,
        }
    }

    pub fn push(&mut self, event: impl Into<LandmarkEvent>) {
        self.events.push(event.into());
    }

    /// Events not yet delivered
    pub fn remaining(&self) -> usize {
        self.events.len() - self.position
    }
}

impl FromIterator<LandmarkEvent> for ReplaySource {
    fn from_iter<I: IntoIterator<Item = LandmarkEvent>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl LandmarkSource for ReplaySource {
    fn next_event(&mut self) -> Option<LandmarkEvent> {
        let event = self.events.get(self.position).cloned()?;
        self.position += 1;
        Some(event)
    }

    fn restart(&mut self) {
        self.position = 0;
    }
}
