//! Storage Layer
//!
//! Persists drowsiness events through a repository, fed by a
//! fire-and-forget background writer.

mod repository;
mod writer;

pub use repository::{DrowsinessLevel, DrowsinessRecord, Repository, StoredEvent};
pub use writer::{EventSink, EventWriter};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Record not found")]
    NotFound,
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}
