use std::ops::Range;
use tracing::{debug, error, trace};

use super::directory::{BlockDirectory, SlotState};
use super::error::{CacheError, CacheResult};
use super::frame::{Frame, FrameId};
use crate::config::{InvariantPolicy, StoreConfig};
use crate::file::{BlockFile, BlockId};

/// Counters describing cache behaviour since open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub flushes: u64,
    pub wired: usize,
    pub frames: usize,
}

/// Fixed pool of frames in front of a `BlockFile`, with least-recently-used eviction
pub struct BufferCache {
    file: BlockFile,
    directory: BlockDirectory,
    frames: Vec<Frame>,
    /// Logical clock; every access takes the next tick, so stamps never tie
    clock: u64,
    slot_size: usize,
    sync_on_flush: bool,
    invariant_policy: InvariantPolicy,
    hits: u64,
    misses: u64,
    evictions: u64,
    flushes: u64,
}

impl BufferCache {
    /// Build a cache over `file`. `config` must already be validated.
    pub fn new(file: BlockFile, config: &StoreConfig) -> Self {
        let block_size = config.block_size();
        let frames = (0..config.frame_count)
            .map(|_| Frame::new(block_size))
            .collect();

        Self {
            directory: BlockDirectory::new(config.block_count, config.slots_per_block),
            file,
            frames,
            clock: 0,
            slot_size: config.slot_size,
            sync_on_flush: config.sync_on_flush,
            invariant_policy: config.invariant_policy,
            hits: 0,
            misses: 0,
            evictions: 0,
            flushes: 0,
        }
    }

    /// Return the frame holding `block`, swapping it in if it is not resident.
    ///
    /// Both hits and swaps refresh the frame's access stamp.
    pub fn resolve(&mut self, block: BlockId) -> CacheResult<FrameId> {
        if block >= self.directory.block_count() {
            return Err(CacheError::BlockOutOfRange {
                block,
                block_count: self.directory.block_count(),
            });
        }

        if let Some(frame_id) = self.directory.entry(block).resident_frame() {
            let owner = self.frames[frame_id].owner();
            if owner != Some(block) {
                return Err(self.violation(format!(
                    "block {} points at frame {} which is wired to {:?}",
                    block, frame_id, owner
                )));
            }
            self.hits += 1;
            self.touch(frame_id);
            trace!(block, frame = frame_id, "Cache hit");
            return Ok(frame_id);
        }

        self.misses += 1;
        self.swap(block)
    }

    /// Refresh a frame's access stamp
    pub fn touch(&mut self, frame_id: FrameId) {
        self.clock += 1;
        self.frames[frame_id].stamp(self.clock);
    }

    /// Prefer any unwired frame; otherwise the wired frame with the oldest
    /// stamp, lowest index on a tie.
    fn next_victim(&self) -> FrameId {
        let mut victim = 0;
        for (frame_id, frame) in self.frames.iter().enumerate() {
            if !frame.is_wired() {
                return frame_id;
            }
            if frame.last_access() < self.frames[victim].last_access() {
                victim = frame_id;
            }
        }
        victim
    }

    fn swap(&mut self, block: BlockId) -> CacheResult<FrameId> {
        let frame_id = self.next_victim();

        if let Some(evicted) = self.frames[frame_id].owner() {
            self.flush_frame(frame_id)?;
            self.evictions += 1;
            debug!(frame = frame_id, evicted, block, "Evicted block");
        }

        if self.frames[frame_id].is_wired() {
            return Err(self.violation(format!(
                "frame {} still wired after flush",
                frame_id
            )));
        }

        self.load_frame(frame_id, block)?;
        self.touch(frame_id);
        Ok(frame_id)
    }

    /// Write a wired frame back to its block and unwire it.
    ///
    /// The write is unconditional; frames carry no dirty bit. On a write
    /// failure the frame stays wired to its block.
    fn flush_frame(&mut self, frame_id: FrameId) -> CacheResult<()> {
        let Some(block) = self.frames[frame_id].owner() else {
            return Err(self.violation(format!("flush on unwired frame {}", frame_id)));
        };

        self.write_back(frame_id, block)?;
        if self.sync_on_flush {
            self.file.sync()?;
        }

        self.frames[frame_id].unwire();
        self.directory.entry_mut(block).set_resident(None);
        Ok(())
    }

    fn load_frame(&mut self, frame_id: FrameId, block: BlockId) -> CacheResult<()> {
        if let Some(owner) = self.frames[frame_id].owner() {
            return Err(self.violation(format!(
                "load of block {} on frame {} already wired to block {}",
                block, frame_id, owner
            )));
        }
        if let Some(other) = self.directory.entry(block).resident_frame() {
            return Err(self.violation(format!(
                "block {} is already wired into frame {}",
                block, other
            )));
        }

        self.file.read_block(block, self.frames[frame_id].data_mut())?;
        self.frames[frame_id].wire(block);
        self.directory.entry_mut(block).set_resident(Some(frame_id));
        trace!(block, frame = frame_id, "Loaded block");
        Ok(())
    }

    fn write_back(&mut self, frame_id: FrameId, block: BlockId) -> CacheResult<()> {
        self.file.write_block(block, self.frames[frame_id].data())?;
        self.flushes += 1;
        Ok(())
    }

    /// Write every wired frame back to disk and sync. Frames stay wired.
    pub fn flush_all(&mut self) -> CacheResult<()> {
        for frame_id in 0..self.frames.len() {
            if let Some(block) = self.frames[frame_id].owner() {
                self.write_back(frame_id, block)?;
            }
        }
        self.file.sync()?;
        debug!(wired = self.wired_count(), "Flushed all frames");
        Ok(())
    }

    /// Log a broken cache invariant and apply the configured policy:
    /// return the error, or panic.
    pub(crate) fn violation(&self, message: String) -> CacheError {
        error!(%message, "Cache invariant violated");
        match self.invariant_policy {
            InvariantPolicy::Error => CacheError::InvariantViolation(message),
            InvariantPolicy::Panic => panic!("cache invariant violated: {}", message),
        }
    }

    /// Set a slot's allocation state in the directory
    pub fn mark_slot(&mut self, block: BlockId, slot: usize, state: SlotState) {
        self.directory.mark_slot(block, slot, state);
    }

    pub fn directory(&self) -> &BlockDirectory {
        &self.directory
    }

    pub fn frame(&self, frame_id: FrameId) -> &Frame {
        &self.frames[frame_id]
    }

    pub fn frame_data(&self, frame_id: FrameId) -> &[u8] {
        self.frames[frame_id].data()
    }

    pub fn frame_data_mut(&mut self, frame_id: FrameId) -> &mut [u8] {
        self.frames[frame_id].data_mut()
    }

    /// Bytes of one slot inside a resident frame
    pub fn slot(&self, frame_id: FrameId, slot: usize) -> &[u8] {
        &self.frames[frame_id].data()[self.slot_range(slot)]
    }

    pub fn slot_mut(&mut self, frame_id: FrameId, slot: usize) -> &mut [u8] {
        let range = self.slot_range(slot);
        &mut self.frames[frame_id].data_mut()[range]
    }

    fn slot_range(&self, slot: usize) -> Range<usize> {
        slot * self.slot_size..(slot + 1) * self.slot_size
    }

    /// Wired frames in frame index order, with the block each one holds
    pub fn wired_frames(&self) -> impl Iterator<Item = (FrameId, BlockId)> + '_ {
        self.frames
            .iter()
            .enumerate()
            .filter_map(|(frame_id, frame)| frame.owner().map(|block| (frame_id, block)))
    }

    pub fn is_resident(&self, block: BlockId) -> bool {
        block < self.directory.block_count()
            && self.directory.entry(block).resident_frame().is_some()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn wired_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_wired()).count()
    }

    pub fn file(&self) -> &BlockFile {
        &self.file
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            flushes: self.flushes,
            wired: self.wired_count(),
            frames: self.frames.len(),
        }
    }
}

impl Drop for BufferCache {
    fn drop(&mut self) {
        // Write resident blocks back so contents survive a reopen
        if let Err(e) = self.flush_all() {
            error!(error = %e, "Failed to flush buffer cache on drop");
        }
    }
}
