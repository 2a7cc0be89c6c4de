mod block_file;
mod error;

pub use block_file::BlockFile;
pub use error::{FileError, FileResult};

/// Block index within the backing file
pub type BlockId = usize;
