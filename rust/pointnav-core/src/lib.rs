// rust/pointnav-core/src/lib.rs

//! PointNav episode dataset loading.
//!
//! This crate loads navigation-episode datasets for embodied-agent
//! simulators: it locates combined and per-scene shard files, decodes their
//! gzip-compressed JSON into typed episodes, rewrites scene asset paths
//! against a local asset root and filters episodes down to requested scenes.

pub mod config;
pub mod error;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::{DatasetConfig, LoaderConfig, SceneSelection, ALL_SCENES_MASK};
pub use error::{DatasetError, Result};
pub use storage::{LocalStorage, StorageBackend, StorageReader};

pub mod dataset;
pub use dataset::{
    scene_from_scene_path, NavigationEpisode, NavigationGoal, PathTemplate, PointNavDataset,
    ShortestPathPoint,
};
