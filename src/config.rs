use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Frames in the buffer cache
pub const DEFAULT_FRAME_COUNT: usize = 256;

/// Blocks in the backing file
pub const DEFAULT_BLOCK_COUNT: usize = 8192;

/// Record slots per block
pub const DEFAULT_SLOTS_PER_BLOCK: usize = 64;

/// Bytes per record slot
pub const DEFAULT_SLOT_SIZE: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// What the buffer cache does when it detects a broken wiring invariant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvariantPolicy {
    /// Return the violation to the caller and leave process policy to it
    #[default]
    Error,
    /// Panic at the point of detection
    Panic,
}

/// Geometry and behaviour of a record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub frame_count: usize,
    pub block_count: usize,
    pub slots_per_block: usize,
    pub slot_size: usize,
    /// Call `sync_data` after every evicted frame is written back
    pub sync_on_flush: bool,
    pub invariant_policy: InvariantPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            frame_count: DEFAULT_FRAME_COUNT,
            block_count: DEFAULT_BLOCK_COUNT,
            slots_per_block: DEFAULT_SLOTS_PER_BLOCK,
            slot_size: DEFAULT_SLOT_SIZE,
            sync_on_flush: true,
            invariant_policy: InvariantPolicy::Error,
        }
    }
}

impl StoreConfig {
    /// Bytes per block: every slot of the block laid out back to back
    pub fn block_size(&self) -> usize {
        self.slots_per_block * self.slot_size
    }

    /// Total size of the backing file in bytes
    pub fn file_size(&self) -> u64 {
        self.block_count as u64 * self.block_size() as u64
    }

    /// Total number of record slots across all blocks
    pub fn capacity(&self) -> usize {
        self.block_count * self.slots_per_block
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let fields = [
            ("frame_count", self.frame_count),
            ("block_count", self.block_count),
            ("slots_per_block", self.slots_per_block),
            ("slot_size", self.slot_size),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be non-zero", name)));
            }
        }

        let block_size = self
            .slots_per_block
            .checked_mul(self.slot_size)
            .ok_or_else(|| ConfigError::Invalid("block size overflows usize".to_string()))?;
        (block_size as u64)
            .checked_mul(self.block_count as u64)
            .ok_or_else(|| ConfigError::Invalid("file size overflows u64".to_string()))?;
        self.block_count
            .checked_mul(self.slots_per_block)
            .ok_or_else(|| ConfigError::Invalid("slot capacity overflows usize".to_string()))?;

        Ok(())
    }

    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.frame_count, 256);
        assert_eq!(config.block_count, 8192);
        assert_eq!(config.block_size(), 64 * 64);
        assert_eq!(config.file_size(), 8192 * 4096);
        assert_eq!(config.capacity(), 8192 * 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_fields_rejected() {
        let config = StoreConfig {
            slot_size: 0,
            ..StoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = StoreConfig {
            frame_count: 0,
            ..StoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_overflowing_geometry_rejected() {
        let config = StoreConfig {
            slots_per_block: usize::MAX,
            slot_size: 2,
            ..StoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        let config = StoreConfig {
            frame_count: 4,
            block_count: 16,
            invariant_policy: InvariantPolicy::Panic,
            ..StoreConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = StoreConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        fs::write(&path, r#"{ "frame_count": 8, "invariant_policy": "panic" }"#).unwrap();

        let loaded = StoreConfig::load(&path).unwrap();
        assert_eq!(loaded.frame_count, 8);
        assert_eq!(loaded.block_count, DEFAULT_BLOCK_COUNT);
        assert_eq!(loaded.invariant_policy, InvariantPolicy::Panic);
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            StoreConfig::load(&path),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");
        assert!(matches!(StoreConfig::load(&path), Err(ConfigError::Io(_))));
    }
}
