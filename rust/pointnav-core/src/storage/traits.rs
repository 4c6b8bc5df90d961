// rust/pointnav-core/src/storage/traits.rs

//! Storage abstraction traits.
//!
//! Defines the read-only operations the dataset loader needs from a storage
//! backend, so that tests and alternative backends can stand in for the
//! local filesystem.

use std::io::Read;
use std::path::Path;

use crate::error::Result;

/// A handle for reading one stored object from start to end.
pub type StorageReader = Box<dyn Read + Send>;

/// The core storage backend trait.
///
/// # Object Safety
///
/// This trait is object-safe and can be used with `Box<dyn StorageBackend>`
/// or `&dyn StorageBackend`.
pub trait StorageBackend: Send + Sync {
    /// Checks if an object (file or directory) exists at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the existence check fails (e.g., permission denied).
    fn exists(&self, path: &Path) -> Result<bool>;

    /// Opens an object for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the object doesn't exist or cannot be opened.
    fn open_read(&self, path: &Path) -> Result<StorageReader>;

    /// Lists the entry names directly inside a directory, sorted.
    ///
    /// A missing directory lists as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a directory or cannot be read.
    fn list(&self, prefix: &Path) -> Result<Vec<String>>;
}
