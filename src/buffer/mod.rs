//! Buffer cache: a fixed pool of frames caching blocks of the backing file.
//!
//! - **BlockDirectory**: per-block slot states plus the frame a block is wired into
//! - **Frame**: one block's bytes while resident, with a logical access stamp
//! - **BufferCache**: lookup-or-load, least-recently-used eviction, flush-before-reuse
//!
//! Frames and directory entries refer to each other by index only; both
//! arrays are owned by the cache.

mod cache;
mod directory;
mod error;
mod frame;

pub use cache::{BufferCache, CacheStats};
pub use directory::{BlockDirectory, DirectoryEntry, SlotState};
pub use error::{CacheError, CacheResult};
pub use frame::{Frame, FrameId, Residency};
