// rust/pointnav-core/src/dataset/parser.rs

//! Decoding of dataset documents.
//!
//! A document is one gzip-compressed JSON file: the combined file of a split
//! or a single scene shard. Decoding is all-or-nothing; a document either
//! yields every one of its episodes or an error.

use std::io::Read;
use std::path::Path;

use flate2::read::MultiGzDecoder;
use serde::Deserialize;

use crate::error::{DatasetError, Result};
use crate::storage::StorageBackend;

use super::episode::NavigationEpisode;
use super::template::PathTemplate;

/// Prefix that dataset files use for scene assets.
pub const DEFAULT_SCENE_PATH_PREFIX: &str = "data/scene_datasets/";

/// One decoded dataset document.
#[derive(Debug, Deserialize)]
pub struct EpisodeDocument {
    pub episodes: Vec<NavigationEpisode>,
    #[serde(default)]
    pub content_scenes_path: Option<PathTemplate>,
}

impl EpisodeDocument {
    /// Parses a JSON document. `origin` only labels errors.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::Deserialization` for malformed JSON, a missing
    /// `episodes` key, or an episode, goal or waypoint that does not match
    /// its record type.
    pub fn parse(json: &str, origin: &Path) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| DatasetError::deserialization(origin, e))
    }

    /// Rewrites every `scene_id` against `scenes_dir`, when given.
    pub fn rebase_scenes(&mut self, scenes_dir: Option<&Path>) {
        if let Some(scenes_dir) = scenes_dir {
            for episode in &mut self.episodes {
                episode.scene_id = rewrite_scene_path(&episode.scene_id, scenes_dir);
            }
        }
    }
}

/// Moves a dataset-relative scene path under the local asset root.
///
/// The default `data/scene_datasets/` prefix is stripped first, so datasets
/// written against the default layout resolve under any asset root. An
/// absolute scene path is kept as is.
pub fn rewrite_scene_path(scene_id: &str, scenes_dir: &Path) -> String {
    let relative = scene_id
        .strip_prefix(DEFAULT_SCENE_PATH_PREFIX)
        .unwrap_or(scene_id);
    scenes_dir.join(relative).to_string_lossy().into_owned()
}

/// Reads and gunzips a dataset document into a string.
///
/// Every member of a multi-member gzip file is decoded, in order.
///
/// # Errors
///
/// Returns `DatasetError::Storage` if the file cannot be opened, the gzip
/// stream is corrupt, or the content is not UTF-8.
pub fn read_document(storage: &dyn StorageBackend, path: &Path) -> Result<String> {
    let reader = storage.open_read(path)?;
    let mut decoder = MultiGzDecoder::new(reader);
    let mut json = String::new();
    decoder.read_to_string(&mut json).map_err(|e| {
        DatasetError::storage_with_source(path, "failed to decompress dataset file", e)
    })?;
    Ok(json)
}
