// rust/pointnav-core/src/config.rs

//! Configuration management for dataset loading.
//!
//! This module provides configuration parsing from TOML files, environment
//! variable overrides, and validation of configuration values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{DatasetError, Result};

/// Scene list entry meaning "every scene the dataset provides".
pub const ALL_SCENES_MASK: &str = "*";

// Top-level loader configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub dataset: DatasetConfig,
    pub storage: StorageConfig,
}

/// Dataset location and scene selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Path template of the combined dataset file; `{split}` is substituted.
    pub data_path: String,
    /// Split identifier, e.g. "train" or "val".
    pub split: String,
    /// Local root of the scene assets episodes refer to.
    pub scenes_dir: PathBuf,
    /// Scenes to load; a list containing "*" selects every scene.
    pub content_scenes: Vec<String>,
}

/// Which scenes a load should keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneSelection {
    All,
    Only(Vec<String>),
}

impl SceneSelection {
    /// Returns true if the scene identifier is selected.
    pub fn contains(&self, scene: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(scenes) => scenes.iter().any(|s| s == scene),
        }
    }
}

// Storage configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    // Root that relative dataset paths are resolved against.
    pub root: PathBuf,
    // Buffer size in bytes for I/O operations.
    pub buffer_size: usize,
    // Whether to use memory-mapped I/O.
    pub use_mmap: bool,
    // File size threshold (bytes) above which to use mmap.
    pub mmap_threshold: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_path: "data/datasets/pointnav/habitat-test-scenes/v1/{split}/{split}.json.gz"
                .to_string(),
            split: "train".to_string(),
            scenes_dir: PathBuf::from("data/scene_datasets"),
            content_scenes: vec![ALL_SCENES_MASK.to_string()],
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            buffer_size: 64 * 1024, // 64 KB
            use_mmap: true,
            mmap_threshold: 1024 * 1024, // 1 MB
        }
    }
}

impl DatasetConfig {
    /// Interprets `content_scenes`, treating any "*" entry as "all scenes".
    pub fn scene_selection(&self) -> SceneSelection {
        if self.content_scenes.iter().any(|s| s == ALL_SCENES_MASK) {
            SceneSelection::All
        } else {
            SceneSelection::Only(self.content_scenes.clone())
        }
    }

    /// Returns a copy of this configuration selecting the given scenes.
    #[must_use]
    pub fn with_content_scenes<I, S>(&self, scenes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            content_scenes: scenes.into_iter().map(Into::into).collect(),
            ..self.clone()
        }
    }

    /// Returns a copy of this configuration for another split.
    #[must_use]
    pub fn with_split(&self, split: impl Into<String>) -> Self {
        Self {
            split: split.into(),
            ..self.clone()
        }
    }

    // Validate dataset configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.data_path.is_empty() {
            return Err(DatasetError::config("dataset.data_path must not be empty"));
        }
        if self.split.is_empty() {
            return Err(DatasetError::config("dataset.split must not be empty"));
        }
        if self.content_scenes.iter().any(|s| s.is_empty()) {
            return Err(DatasetError::config(
                "dataset.content_scenes must not contain empty scene names",
            ));
        }
        Ok(())
    }
}

impl FromStr for LoaderConfig {
    type Err = DatasetError;

    /// Parse configuration from a TOML string.
    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| DatasetError::config_with_source("failed to parse TOML config", e))
    }
}

impl LoaderConfig {
    // Load configuration from a TOML file.
    //
    // # Errors
    //
    // Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DatasetError::storage_with_source(path, "failed to read config file", e)
        })?;
        let config: Self = content.parse()?;
        config.validate()?;
        Ok(config)
    }

    // Apply environment variable overrides.
    //
    // Environment variables are prefixed with `PNAV_` and use underscores
    // to separate nested fields. For example:
    // - `PNAV_DATASET_DATA_PATH` overrides `dataset.data_path`
    // - `PNAV_DATASET_SPLIT` overrides `dataset.split`
    // - `PNAV_DATASET_CONTENT_SCENES` overrides `dataset.content_scenes` (comma separated)
    // - `PNAV_STORAGE_ROOT` overrides `storage.root`
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        // Dataset overrides
        if let Ok(val) = std::env::var("PNAV_DATASET_DATA_PATH") {
            self.dataset.data_path = val;
        }
        if let Ok(val) = std::env::var("PNAV_DATASET_SPLIT") {
            self.dataset.split = val;
        }
        if let Ok(val) = std::env::var("PNAV_DATASET_SCENES_DIR") {
            self.dataset.scenes_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("PNAV_DATASET_CONTENT_SCENES") {
            self.dataset.content_scenes = parse_scene_list(&val);
        }

        // Storage overrides
        if let Ok(val) = std::env::var("PNAV_STORAGE_ROOT") {
            self.storage.root = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("PNAV_STORAGE_BUFFER_SIZE") {
            if let Ok(v) = val.parse() {
                self.storage.buffer_size = v;
            }
        }
        if let Ok(val) = std::env::var("PNAV_STORAGE_USE_MMAP") {
            if let Ok(v) = val.parse() {
                self.storage.use_mmap = v;
            }
        }
        if let Ok(val) = std::env::var("PNAV_STORAGE_MMAP_THRESHOLD") {
            if let Ok(v) = val.parse() {
                self.storage.mmap_threshold = v;
            }
        }

        self
    }

    // Validate all configuration values.
    //
    // # Errors
    //
    // Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        self.dataset.validate()?;

        if self.storage.buffer_size == 0 {
            return Err(DatasetError::config(
                "storage.buffer_size must be greater than 0",
            ));
        }

        Ok(())
    }
}

/// Splits a comma separated scene list, dropping blank entries.
pub fn parse_scene_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
