// rust/pointnav-core/src/storage/mod.rs

//! Storage abstraction for dataset loading.
//!
//! The loader never touches `std::fs` directly: it asks a `StorageBackend`
//! whether a directory exists, what a directory contains and for a reader
//! over a dataset file. `LocalStorage` serves these from the local
//! filesystem, resolving relative paths against a configurable root.
//!
//! # Example
//!
//! ```no_run
//! use pointnav_core::config::StorageConfig;
//! use pointnav_core::storage::{LocalStorage, StorageBackend};
//! use std::io::Read;
//! use std::path::Path;
//!
//! let storage = LocalStorage::new(&StorageConfig::default()).unwrap();
//!
//! if storage.exists(Path::new("data/datasets")).unwrap() {
//!     let mut reader = storage.open_read(Path::new("data/datasets/train.json.gz")).unwrap();
//!     let mut raw = Vec::new();
//!     reader.read_to_end(&mut raw).unwrap();
//! }
//! ```

mod local;
mod traits;

pub use local::LocalStorage;
pub use traits::{StorageBackend, StorageReader};
