//! Repository Implementation

use crate::StorageError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, info};

/// Drowsiness level carried by a persisted event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrowsinessLevel {
    Moderate,
    Severe,
}

impl DrowsinessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

/// Drowsiness event payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrowsinessRecord {
    pub vehicle_id: String,
    pub drowsiness_level: DrowsinessLevel,
    pub confidence: f64,
    pub eye_aspect_ratio: f64,
    pub alert_triggered: bool,
}

impl DrowsinessRecord {
    fn validate(&self) -> Result<(), StorageError> {
        if self.vehicle_id.is_empty() {
            return Err(StorageError::InvalidRecord("empty vehicle_id".into()));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(StorageError::InvalidRecord(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        if !self.eye_aspect_ratio.is_finite() {
            return Err(StorageError::InvalidRecord("non-finite eye_aspect_ratio".into()));
        }
        Ok(())
    }
}

/// A record as stored, with its assigned id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: i64,
    /// Receive time, ms since the Unix epoch
    pub timestamp_ms: i64,
    #[serde(flatten)]
    pub record: DrowsinessRecord,
}

struct Inner {
    events: VecDeque<StoredEvent>,
    next_id: i64,
}

/// Repository for drowsiness events (in-memory implementation)
pub struct Repository {
    inner: Mutex<Inner>,
    /// Max retained events
    max_events: usize,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    /// Create a repository that keeps at most `max_events`
    pub fn with_capacity(max_events: usize) -> Self {
        info!("Creating in-memory event repository (retention: {})", max_events);
        Self {
            inner: Mutex::new(Inner {
                events: VecDeque::with_capacity(max_events.min(1024)),
                next_id: 1,
            }),
            max_events: max_events.max(1),
        }
    }

    /// Insert an event, returning its id
    pub fn insert_event(&self, record: DrowsinessRecord) -> Result<i64, StorageError> {
        record.validate()?;

        let mut inner = self.inner.lock().map_err(|e| {
            StorageError::Database(format!("Lock error: {}", e))
        })?;

        let id = inner.next_id;
        inner.next_id += 1;

        // Enforce retention
        while inner.events.len() >= self.max_events {
            inner.events.pop_front();
        }

        inner.events.push_back(StoredEvent {
            id,
            timestamp_ms: Utc::now().timestamp_millis(),
            record,
        });
        debug!("Inserted drowsiness event with ID {}", id);

        Ok(id)
    }

    /// Get events, newest first, optionally filtered by level
    pub fn get_events(
        &self,
        level: Option<DrowsinessLevel>,
        limit: usize,
    ) -> Result<Vec<StoredEvent>, StorageError> {
        let inner = self.inner.lock().map_err(|e| {
            StorageError::Database(format!("Lock error: {}", e))
        })?;

        Ok(inner
            .events
            .iter()
            .rev()
            .filter(|e| level.map_or(true, |l| e.record.drowsiness_level == l))
            .take(limit)
            .cloned()
            .collect())
    }

    /// Get a single event by id
    pub fn get_event(&self, id: i64) -> Result<StoredEvent, StorageError> {
        let inner = self.inner.lock().map_err(|e| {
            StorageError::Database(format!("Lock error: {}", e))
        })?;

        inner
            .events
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    /// Get total event count
    pub fn event_count(&self) -> usize {
        self.inner.lock().map(|i| i.events.len()).unwrap_or(0)
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
