use super::record::RecordId;
use crate::buffer::CacheError;
use crate::config::ConfigError;
use crate::file::FileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Out of space: all {capacity} record slots are in use")]
    OutOfSpace { capacity: usize },

    #[error("Invalid record id: {0}")]
    InvalidRecordId(RecordId),

    #[error("Record not allocated: {0}")]
    NotAllocated(RecordId),

    #[error("Record too large: {size} bytes, slot size is {slot_size}")]
    RecordTooLarge { size: usize, slot_size: usize },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl RecordError {
    /// True when the cache's frame/directory wiring is broken. Continuing to
    /// use the store after this risks corrupting the block mapping.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RecordError::Cache(CacheError::InvariantViolation(_)))
    }
}

pub type RecordResult<T> = Result<T, RecordError>;
