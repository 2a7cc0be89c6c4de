pub mod buffer;
pub mod config;
pub mod file;
pub mod record;
pub mod repl;

pub use buffer::{BufferCache, CacheError, CacheResult, CacheStats, SlotState};
pub use config::{ConfigError, InvariantPolicy, StoreConfig};
pub use file::{BlockFile, BlockId, FileError, FileResult};
pub use record::{RecordError, RecordId, RecordResult, RecordStore, RecordView, StoreStats};
