use super::frame::FrameId;
use crate::file::BlockId;

/// Allocation state of one record slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Free,
    Used,
}

/// In-memory metadata for one block, present whether or not the block is resident
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    block: BlockId,
    resident_frame: Option<FrameId>,
    slots: Vec<SlotState>,
    free_slots: usize,
}

impl DirectoryEntry {
    fn new(block: BlockId, slots_per_block: usize) -> Self {
        Self {
            block,
            resident_frame: None,
            slots: vec![SlotState::Free; slots_per_block],
            free_slots: slots_per_block,
        }
    }

    pub fn block(&self) -> BlockId {
        self.block
    }

    /// Frame this block is wired into, if any
    pub fn resident_frame(&self) -> Option<FrameId> {
        self.resident_frame
    }

    pub(super) fn set_resident(&mut self, frame: Option<FrameId>) {
        self.resident_frame = frame;
    }

    pub fn slot_state(&self, slot: usize) -> SlotState {
        self.slots[slot]
    }

    pub fn has_free_slot(&self) -> bool {
        self.free_slots > 0
    }

    /// Lowest-numbered free slot in this block
    pub fn first_free_slot(&self) -> Option<usize> {
        if self.free_slots == 0 {
            return None;
        }
        self.slots.iter().position(|&s| s == SlotState::Free)
    }

    pub fn free_slot_count(&self) -> usize {
        self.free_slots
    }

    pub fn used_slot_count(&self) -> usize {
        self.slots.len() - self.free_slots
    }

    fn mark(&mut self, slot: usize, state: SlotState) {
        let previous = std::mem::replace(&mut self.slots[slot], state);
        match (previous, state) {
            (SlotState::Free, SlotState::Used) => self.free_slots -= 1,
            (SlotState::Used, SlotState::Free) => self.free_slots += 1,
            _ => {}
        }
    }
}

/// One entry per block of the backing file, created at open and never destroyed.
///
/// Slot states are not persisted; a fresh directory reports every slot free.
#[derive(Debug, Clone)]
pub struct BlockDirectory {
    entries: Vec<DirectoryEntry>,
    slots_per_block: usize,
}

impl BlockDirectory {
    pub fn new(block_count: usize, slots_per_block: usize) -> Self {
        let entries = (0..block_count)
            .map(|block| DirectoryEntry::new(block, slots_per_block))
            .collect();
        Self {
            entries,
            slots_per_block,
        }
    }

    pub fn block_count(&self) -> usize {
        self.entries.len()
    }

    pub fn slots_per_block(&self) -> usize {
        self.slots_per_block
    }

    pub fn entry(&self, block: BlockId) -> &DirectoryEntry {
        &self.entries[block]
    }

    pub(super) fn entry_mut(&mut self, block: BlockId) -> &mut DirectoryEntry {
        &mut self.entries[block]
    }

    /// First block, in increasing index order, with at least one free slot.
    /// `None` means the store is out of space.
    pub fn find_block_with_free_slot(&self) -> Option<BlockId> {
        self.entries
            .iter()
            .find(|entry| entry.has_free_slot())
            .map(|entry| entry.block)
    }

    /// Set the state of one slot.
    ///
    /// Callers only move a slot to the opposite of its current state; the
    /// record allocator checks this before calling.
    pub fn mark_slot(&mut self, block: BlockId, slot: usize, state: SlotState) {
        self.entries[block].mark(slot, state);
    }

    pub fn slot_state(&self, block: BlockId, slot: usize) -> SlotState {
        self.entries[block].slot_state(slot)
    }

    pub fn used_slots(&self) -> usize {
        self.entries.iter().map(DirectoryEntry::used_slot_count).sum()
    }

    pub fn free_slots(&self) -> usize {
        self.entries.iter().map(DirectoryEntry::free_slot_count).sum()
    }
}
