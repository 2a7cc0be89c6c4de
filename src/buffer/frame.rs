use crate::file::BlockId;

/// Index into the frame pool
pub type FrameId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    Unwired,
    Wired,
}

/// In-memory cache line holding one block's bytes while the block is resident
pub struct Frame {
    owner: Option<BlockId>,
    data: Box<[u8]>,
    last_access: u64,
}

impl Frame {
    pub(super) fn new(block_size: usize) -> Self {
        Self {
            owner: None,
            data: vec![0u8; block_size].into_boxed_slice(),
            last_access: 0,
        }
    }

    /// Block currently wired into this frame
    pub fn owner(&self) -> Option<BlockId> {
        self.owner
    }

    pub fn residency(&self) -> Residency {
        if self.owner.is_some() {
            Residency::Wired
        } else {
            Residency::Unwired
        }
    }

    pub fn is_wired(&self) -> bool {
        self.owner.is_some()
    }

    pub fn last_access(&self) -> u64 {
        self.last_access
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(super) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub(super) fn wire(&mut self, block: BlockId) {
        self.owner = Some(block);
    }

    pub(super) fn unwire(&mut self) {
        self.owner = None;
    }

    pub(super) fn stamp(&mut self, tick: u64) {
        self.last_access = tick;
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("owner", &self.owner)
            .field("last_access", &self.last_access)
            .field("len", &self.data.len())
            .finish()
    }
}
