//! Fire-and-forget event submission

use crate::{DrowsinessRecord, Repository};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Accepts drowsiness records for persistence.
///
/// `submit` must not block and never reports failure to the caller;
/// implementations log what goes wrong.
pub trait EventSink: Send + Sync {
    fn submit(&self, record: DrowsinessRecord);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn submit(&self, record: DrowsinessRecord) {
        (**self).submit(record)
    }
}

/// Synchronous insert, for hosts without a runtime
impl EventSink for Repository {
    fn submit(&self, record: DrowsinessRecord) {
        if let Err(e) = self.insert_event(record) {
            error!("Failed to persist drowsiness event: {}", e);
        }
    }
}

/// Hands records to a background task that writes them to a [`Repository`].
///
/// Records are written in submission order. Dropping every clone of the
/// writer lets the task drain the queue and finish.
#[derive(Debug, Clone)]
pub struct EventWriter {
    tx: mpsc::UnboundedSender<DrowsinessRecord>,
}

impl EventWriter {
    /// Start the background task. Must be called inside a Tokio runtime.
    ///
    /// The returned handle resolves to the number of records written.
    pub fn spawn(repository: Arc<Repository>) -> (Self, JoinHandle<usize>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<DrowsinessRecord>();

        let handle = tokio::spawn(async move {
            let mut written = 0usize;
            while let Some(record) = rx.recv().await {
                let level = record.drowsiness_level;
                match repository.insert_event(record) {
                    Ok(id) => {
                        written += 1;
                        debug!("Persisted {} event as {}", level.as_str(), id);
                    }
                    Err(e) => error!("Failed to persist drowsiness event: {}", e),
                }
            }
            info!("Event writer stopped after {} records", written);
            written
        });

        (Self { tx }, handle)
    }
}

impl EventSink for EventWriter {
    fn submit(&self, record: DrowsinessRecord) {
        if let Err(e) = self.tx.send(record) {
            warn!(
                "Event writer closed, dropping {} event",
                e.0.drowsiness_level.as_str()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DrowsinessLevel;

    fn record(level: DrowsinessLevel, ear: f64) -> DrowsinessRecord {
        DrowsinessRecord {
            vehicle_id: "bus-12".to_string(),
            drowsiness_level: level,
            confidence: 0.9,
            eye_aspect_ratio: ear,
            alert_triggered: level == DrowsinessLevel::Severe,
        }
    }

    #[tokio::test]
    async fn test_writer_persists_in_order() {
        let repo = Arc::new(Repository::new());
        let (writer, handle) = EventWriter::spawn(repo.clone());

        writer.submit(record(DrowsinessLevel::Moderate, 0.17));
        writer.submit(record(DrowsinessLevel::Severe, 0.10));
        drop(writer);

        assert_eq!(handle.await.unwrap(), 2);
        let events = repo.get_events(None, 10).unwrap();
        assert_eq!(events[0].record.drowsiness_level, DrowsinessLevel::Severe);
        assert_eq!(events[1].record.drowsiness_level, DrowsinessLevel::Moderate);
    }

    #[tokio::test]
    async fn test_writer_swallows_insert_failures() {
        let repo = Arc::new(Repository::new());
        let (writer, handle) = EventWriter::spawn(repo.clone());

        let mut bad = record(DrowsinessLevel::Severe, 0.1);
        bad.confidence = 2.0;
        writer.submit(bad);
        writer.submit(record(DrowsinessLevel::Severe, 0.1));
        drop(writer);

        assert_eq!(handle.await.unwrap(), 1);
        assert_eq!(repo.event_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_after_task_gone_does_not_panic() {
        let repo = Arc::new(Repository::new());
        let (writer, handle) = EventWriter::spawn(repo.clone());
        handle.abort();
        let _ = handle.await;

        writer.submit(record(DrowsinessLevel::Moderate, 0.18));
        assert_eq!(repo.event_count(), 0);
    }

    #[test]
    fn test_repository_as_sink() {
        let repo = Repository::new();
        repo.submit(record(DrowsinessLevel::Moderate, 0.18));
        assert_eq!(repo.event_count(), 1);
    }
}
