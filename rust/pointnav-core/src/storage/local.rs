// rust/pointnav-core/src/storage/local.rs

//! Local filesystem storage backend implementation.
//!
//! Dataset files are read either through a buffered reader or, above a size
//! threshold, through a memory map. Shard directories of large datasets hold
//! hundreds of files, so small files stay on the cheaper buffered path.

use std::fs::{self, File};
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use tracing::debug;

use super::traits::{StorageBackend, StorageReader};
use crate::config::StorageConfig;
use crate::error::{DatasetError, Result};

/// Local filesystem storage backend.
pub struct LocalStorage {
    /// Root that relative paths are resolved against.
    root: PathBuf,
    /// Buffer size for buffered I/O operations.
    buffer_size: usize,
    /// Whether to use memory-mapped I/O.
    use_mmap: bool,
    /// File size threshold above which to use mmap.
    mmap_threshold: u64,
}

impl LocalStorage {
    /// Creates a new `LocalStorage` instance from configuration.
    ///
    /// The root directory is not created; a missing root simply makes every
    /// relative path report as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer size is zero.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        if config.buffer_size == 0 {
            return Err(DatasetError::config(
                "storage.buffer_size must be greater than 0",
            ));
        }

        Ok(Self {
            root: config.root.clone(),
            buffer_size: config.buffer_size,
            use_mmap: config.use_mmap,
            mmap_threshold: config.mmap_threshold,
        })
    }

    /// Returns the root relative paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a path relative to the root.
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl StorageBackend for LocalStorage {
    fn exists(&self, path: &Path) -> Result<bool> {
        let full_path = self.resolve_path(path);
        full_path.try_exists().map_err(|e| {
            DatasetError::storage_with_source(&full_path, "failed to check existence", e)
        })
    }

    fn open_read(&self, path: &Path) -> Result<StorageReader> {
        let full_path = self.resolve_path(path);
        let file = File::open(&full_path)
            .map_err(|e| DatasetError::storage_with_source(&full_path, "failed to open file", e))?;

        let meta = file.metadata().map_err(|e| {
            DatasetError::storage_with_source(&full_path, "failed to read file metadata", e)
        })?;
        let size = meta.len();

        if self.use_mmap && size >= self.mmap_threshold {
            // SAFETY: The file is opened read-only and the Mmap is owned by the
            // reader for its whole lifetime.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| {
                DatasetError::storage_with_source(&full_path, "failed to memory-map file", e)
            })?;

            Ok(Box::new(Cursor::new(mmap)))
        } else {
            Ok(Box::new(BufReader::with_capacity(self.buffer_size, file)))
        }
    }

    fn list(&self, prefix: &Path) -> Result<Vec<String>> {
        let full_path = self.resolve_path(prefix);

        if !full_path.exists() {
            return Ok(Vec::new());
        }

        if !full_path.is_dir() {
            return Err(DatasetError::storage(&full_path, "path is not a directory"));
        }

        let mut entries = Vec::new();

        for entry in fs::read_dir(&full_path).map_err(|e| {
            DatasetError::storage_with_source(&full_path, "failed to read directory", e)
        })? {
            let entry = entry.map_err(|e| {
                DatasetError::storage_with_source(&full_path, "failed to read directory entry", e)
            })?;

            let name = entry.file_name();
            match name.to_str() {
                Some(name) => entries.push(name.to_string()),
                None => {
                    let lossy = name.to_string_lossy().into_owned();
                    debug!(
                        "Entry {:?} in {} is not valid UTF-8, listing it as {}",
                        name,
                        full_path.display(),
                        lossy
                    );
                    entries.push(lossy);
                }
            }
        }

        entries.sort();
        Ok(entries)
    }
}
