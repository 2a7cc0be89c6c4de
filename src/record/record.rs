use std::fmt;
use std::str::FromStr;

use super::error::RecordError;
use crate::file::BlockId;

/// Slot identifier within a block
pub type SlotId = usize;

/// Stable address of a record (block + slot), independent of cache residency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    pub block: BlockId,
    pub slot: SlotId,
}

impl RecordId {
    pub fn new(block: BlockId, slot: SlotId) -> Self {
        Self { block, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block, self.slot)
    }
}

/// Parses the `block:slot` form produced by `Display`
impl FromStr for RecordId {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (block, slot) = s
            .split_once(':')
            .ok_or_else(|| RecordError::Parse(format!("expected block:slot, got '{}'", s)))?;
        let block = block
            .trim()
            .parse()
            .map_err(|_| RecordError::Parse(format!("invalid block number '{}'", block)))?;
        let slot = slot
            .trim()
            .parse()
            .map_err(|_| RecordError::Parse(format!("invalid slot number '{}'", slot)))?;
        Ok(Self { block, slot })
    }
}

/// Owned copy of one record's slot bytes.
///
/// A view never points into cache memory, so it stays valid after the
/// owning block is evicted. Changes are written back with `RecordStore::store`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordView {
    id: RecordId,
    data: Vec<u8>,
}

impl RecordView {
    pub(super) fn new(id: RecordId, data: Vec<u8>) -> Self {
        Self { id, data }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Full slot contents, `slot_size` bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Slot contents with trailing zero padding removed
    pub fn payload(&self) -> &[u8] {
        let end = self
            .data
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1);
        &self.data[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let id = RecordId::new(12, 3);
        assert_eq!(id.to_string(), "12:3");
        assert_eq!("12:3".parse::<RecordId>().unwrap(), id);
        assert_eq!(" 7 : 0 ".parse::<RecordId>().unwrap(), RecordId::new(7, 0));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("12".parse::<RecordId>(), Err(RecordError::Parse(_))));
        assert!(matches!("a:1".parse::<RecordId>(), Err(RecordError::Parse(_))));
        assert!(matches!("1:-1".parse::<RecordId>(), Err(RecordError::Parse(_))));
    }

    #[test]
    fn test_ordering() {
        assert!(RecordId::new(0, 63) < RecordId::new(1, 0));
        assert!(RecordId::new(1, 1) > RecordId::new(1, 0));
    }

    #[test]
    fn test_view_payload() {
        let view = RecordView::new(RecordId::new(0, 0), vec![b'h', b'i', 0, 0]);
        assert_eq!(view.payload(), b"hi");
        assert_eq!(view.data().len(), 4);

        let empty = RecordView::new(RecordId::new(0, 1), vec![0; 4]);
        assert!(empty.payload().is_empty());
    }
}
