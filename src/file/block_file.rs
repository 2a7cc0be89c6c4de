use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::BlockId;
use super::error::{FileError, FileResult};
use crate::config::StoreConfig;

/// Fixed-size backing file holding `block_count` blocks of `block_size` bytes
pub struct BlockFile {
    file: File,
    path: PathBuf,
    block_count: usize,
    block_size: usize,
}

impl BlockFile {
    /// Open the backing file, creating and zero-filling it if it does not exist.
    ///
    /// An existing file is never reinitialized. If it is shorter than the
    /// configured geometry it is extended with zeroes.
    pub fn open<P: AsRef<Path>>(path: P, config: &StoreConfig) -> FileResult<Self> {
        let path = path.as_ref();
        let file_size = config.file_size();

        let file = if path.exists() {
            let file = OpenOptions::new().read(true).write(true).open(path)?;
            let current_size = file.metadata()?.len();
            if current_size < file_size {
                debug!(
                    path = %path.display(),
                    current_size,
                    file_size,
                    "Extending short backing file"
                );
                file.set_len(file_size)?;
            }
            info!(path = %path.display(), "Opened existing backing file");
            file
        } else {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }

            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create_new(true)
                .open(path)?;
            // set_len on a fresh file reads back as zeroes
            file.set_len(file_size)?;
            file.sync_all()?;
            info!(path = %path.display(), file_size, "Created new backing file");
            file
        };

        Ok(Self {
            file,
            path: path.to_path_buf(),
            block_count: config.block_count,
            block_size: config.block_size(),
        })
    }

    /// Read one block into `buffer`, which must be exactly one block long
    pub fn read_block(&mut self, block: BlockId, buffer: &mut [u8]) -> FileResult<()> {
        let offset = self.block_offset(block, buffer.len())?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buffer)?;
        Ok(())
    }

    /// Write one block from `buffer`, which must be exactly one block long
    pub fn write_block(&mut self, block: BlockId, buffer: &[u8]) -> FileResult<()> {
        let offset = self.block_offset(block, buffer.len())?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buffer)?;
        Ok(())
    }

    /// Flush OS buffers for the backing file to disk
    pub fn sync(&mut self) -> FileResult<()> {
        self.file.sync_data()?;
        Ok(())
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn block_offset(&self, block: BlockId, len: usize) -> FileResult<u64> {
        if len != self.block_size {
            return Err(FileError::InvalidBlockSize {
                expected: self.block_size,
                actual: len,
            });
        }
        if block >= self.block_count {
            return Err(FileError::BlockOutOfRange {
                block,
                block_count: self.block_count,
            });
        }
        Ok(block as u64 * self.block_size as u64)
    }
}
