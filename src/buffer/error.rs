use crate::file::FileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Block out of range: block={block}, block_count={block_count}")]
    BlockOutOfRange { block: usize, block_count: usize },

    #[error("Cache invariant violated: {0}")]
    InvariantViolation(String),
}

pub type CacheResult<T> = Result<T, CacheError>;
