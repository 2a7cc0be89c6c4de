//! Fixed-size record allocation on top of the buffer cache.
//!
//! A record is one slot of a block, addressed by a `RecordId`. Reads hand
//! out owned `RecordView` copies; writes go through `RecordStore::store`.

mod error;
mod record;
mod store;


pub use error::{RecordError, RecordResult};
pub use record::{RecordId, RecordView, SlotId};
pub use store::{RecordStore, StoreStats};
