use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Block out of range: block={block}, block_count={block_count}")]
    BlockOutOfRange { block: usize, block_count: usize },

    #[error("Invalid block size: expected {expected}, got {actual}")]
    InvalidBlockSize { expected: usize, actual: usize },
}

pub type FileResult<T> = Result<T, FileError>;
