use std::path::Path;
use tracing::{debug, info, warn};

use super::error::{RecordError, RecordResult};
use super::record::{RecordId, RecordView};
use crate::buffer::{BufferCache, CacheStats, SlotState};
use crate::config::StoreConfig;
use crate::file::{BlockFile, BlockId};

/// Snapshot of slot usage and cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub cache: CacheStats,
    pub used_slots: usize,
    pub free_slots: usize,
    pub capacity: usize,
}

/// Fixed-size record allocator over a paged backing file.
///
/// Records are `slot_size` byte slots addressed by `RecordId`. Slot
/// allocation state lives only in memory; every open starts with all
/// slots free, whatever the file contains.
pub struct RecordStore {
    cache: BufferCache,
    config: StoreConfig,
}

impl RecordStore {
    /// Open the store at `path` with the default geometry
    pub fn init<P: AsRef<Path>>(path: P) -> RecordResult<Self> {
        Self::open(path, StoreConfig::default())
    }

    pub fn open<P: AsRef<Path>>(path: P, config: StoreConfig) -> RecordResult<Self> {
        config.validate()?;
        let file = BlockFile::open(path.as_ref(), &config)?;
        let cache = BufferCache::new(file, &config);

        info!(
            path = %path.as_ref().display(),
            frames = config.frame_count,
            blocks = config.block_count,
            slots_per_block = config.slots_per_block,
            slot_size = config.slot_size,
            "Opened record store"
        );

        Ok(Self { cache, config })
    }

    /// Allocate a free slot and return its id.
    ///
    /// Blocks already resident are tried first so that no I/O is needed;
    /// only when none of them has room is another block swapped in.
    pub fn allocate(&mut self) -> RecordResult<RecordId> {
        let resident = self.cache.wired_frames().find_map(|(frame_id, block)| {
            self.cache
                .directory()
                .entry(block)
                .first_free_slot()
                .map(|slot| (frame_id, block, slot))
        });

        if let Some((frame_id, block, slot)) = resident {
            self.cache.mark_slot(block, slot, SlotState::Used);
            self.cache.touch(frame_id);
            let id = RecordId::new(block, slot);
            debug!(%id, frame = frame_id, "Allocated record in resident block");
            return Ok(id);
        }

        let Some(block) = self.cache.directory().find_block_with_free_slot() else {
            warn!(capacity = self.config.capacity(), "Record store is out of space");
            return Err(RecordError::OutOfSpace {
                capacity: self.config.capacity(),
            });
        };

        let frame_id = self.cache.resolve(block)?;
        let Some(slot) = self.cache.directory().entry(block).first_free_slot() else {
            let message = format!(
                "block {} reported a free slot but has none after swap-in",
                block
            );
            return Err(self.cache.violation(message).into());
        };

        self.cache.mark_slot(block, slot, SlotState::Used);
        let id = RecordId::new(block, slot);
        debug!(%id, frame = frame_id, "Allocated record after swap-in");
        Ok(id)
    }

    /// Copy the bytes of an allocated record out of the cache
    pub fn lookup(&mut self, id: RecordId) -> RecordResult<RecordView> {
        self.check_bounds(id)?;
        self.check_allocated(id)?;

        let frame_id = self.cache.resolve(id.block)?;
        let data = self.cache.slot(frame_id, id.slot).to_vec();
        Ok(RecordView::new(id, data))
    }

    /// Overwrite an allocated record. Payloads shorter than the slot are
    /// zero-padded.
    pub fn store(&mut self, id: RecordId, bytes: &[u8]) -> RecordResult<()> {
        self.check_bounds(id)?;
        if bytes.len() > self.config.slot_size {
            return Err(RecordError::RecordTooLarge {
                size: bytes.len(),
                slot_size: self.config.slot_size,
            });
        }
        self.check_allocated(id)?;

        let frame_id = self.cache.resolve(id.block)?;
        let slot = self.cache.slot_mut(frame_id, id.slot);
        slot[..bytes.len()].copy_from_slice(bytes);
        slot[bytes.len()..].fill(0);
        Ok(())
    }

    /// Allocate a record and write `bytes` into it
    pub fn insert(&mut self, bytes: &[u8]) -> RecordResult<RecordId> {
        if bytes.len() > self.config.slot_size {
            return Err(RecordError::RecordTooLarge {
                size: bytes.len(),
                slot_size: self.config.slot_size,
            });
        }

        let id = self.allocate()?;
        self.store(id, bytes)?;
        Ok(id)
    }

    /// Release a record's slot.
    ///
    /// Only the directory is touched, so the owning block need not be
    /// resident. The slot's bytes are left in place; whoever allocates it
    /// next must overwrite them.
    pub fn free(&mut self, id: RecordId) -> RecordResult<()> {
        self.check_bounds(id)?;
        self.check_allocated(id)?;

        self.cache.mark_slot(id.block, id.slot, SlotState::Free);
        debug!(%id, "Freed record");
        Ok(())
    }

    /// Write every resident block back to the backing file
    pub fn flush(&mut self) -> RecordResult<()> {
        self.cache.flush_all()?;
        Ok(())
    }

    pub fn is_allocated(&self, id: RecordId) -> bool {
        self.check_bounds(id).is_ok()
            && self.cache.directory().slot_state(id.block, id.slot) == SlotState::Used
    }

    pub fn is_resident(&self, block: BlockId) -> bool {
        self.cache.is_resident(block)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        self.cache.file().path()
    }

    pub fn stats(&self) -> StoreStats {
        let directory = self.cache.directory();
        StoreStats {
            cache: self.cache.stats(),
            used_slots: directory.used_slots(),
            free_slots: directory.free_slots(),
            capacity: self.config.capacity(),
        }
    }

    fn check_bounds(&self, id: RecordId) -> RecordResult<()> {
        if id.block >= self.config.block_count || id.slot >= self.config.slots_per_block {
            return Err(RecordError::InvalidRecordId(id));
        }
        Ok(())
    }

    fn check_allocated(&self, id: RecordId) -> RecordResult<()> {
        match self.cache.directory().slot_state(id.block, id.slot) {
            SlotState::Used => Ok(()),
            SlotState::Free => Err(RecordError::NotAllocated(id)),
        }
    }
}
