// rust/pointnav-core/src/dataset/mod.rs

//! PointNav episode datasets.
//!
//! This module resolves where a split's episodes live on disk, decodes the
//! gzip-compressed JSON documents into typed episodes and assembles them into
//! a `PointNavDataset`. Splits come either as a single combined file or as a
//! combined file plus one shard per scene.
//!
//! # Example
//!
//! ```no_run
//! use pointnav_core::config::{DatasetConfig, StorageConfig};
//! use pointnav_core::dataset::PointNavDataset;
//! use pointnav_core::storage::LocalStorage;
//!
//! let storage = LocalStorage::new(&StorageConfig::default()).unwrap();
//! let config = DatasetConfig::default().with_split("val");
//!
//! for scene in PointNavDataset::scenes_to_load(&config, &storage).unwrap() {
//!     let scene_config = config.with_content_scenes([scene.as_str()]);
//!     let dataset = PointNavDataset::load(&scene_config, &storage).unwrap();
//!     println!("{scene}: {} episodes", dataset.num_episodes());
//! }
//! ```

mod discovery;
mod episode;
mod parser;
mod pointnav;
mod template;

pub use discovery::scenes_in_folder;
pub use episode::{NavigationEpisode, NavigationGoal, PathAction, ShortestPathPoint};
pub use parser::{read_document, rewrite_scene_path, EpisodeDocument, DEFAULT_SCENE_PATH_PREFIX};
pub use pointnav::{scene_from_scene_path, PointNavDataset};
pub use template::{PathTemplate, DATA_PATH, DEFAULT_CONTENT_SCENES_PATH, SCENE, SPLIT};
