//! Storage Layer
//!
//! In-memory history repository with retention limits. The engine
//! appends fire-and-forget; a durable backend sits behind the same
//! interface in a full deployment.

mod repository;

pub use repository::{AlertRecord, ReadingRecord, Repository, RetentionConfig};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// A history lock was poisoned by a panicking writer
    #[error("storage lock poisoned: {0}")]
    Lock(String),
}
