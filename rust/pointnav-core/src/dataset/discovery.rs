// rust/pointnav-core/src/dataset/discovery.rs

use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::storage::StorageBackend;

use super::template::PathTemplate;

/// List the scenes that have their own shard file.
///
/// The template is split around `{scene}`: the part before it, with
/// `{data_path}` set to `dataset_dir`, names the shard directory and the part
/// after it is the shard file extension. Every directory entry ending in that
/// extension contributes one scene identifier.
///
/// # Returns
///
/// Scene identifiers sorted ascending, or an empty list when the shard
/// directory does not exist.
///
/// # Errors
///
/// Returns an error if the template has no `{scene}` placeholder or the
/// directory cannot be listed.
pub fn scenes_in_folder(
    storage: &dyn StorageBackend,
    content_scenes_path: &PathTemplate,
    dataset_dir: &str,
) -> Result<Vec<String>> {
    let (_, extension) = content_scenes_path.split_scene()?;
    let content_dir = content_scenes_path.scene_dir(dataset_dir)?;

    if !storage.exists(Path::new(&content_dir))? {
        debug!("No shard directory at {}", content_dir);
        return Ok(Vec::new());
    }

    let mut scenes: Vec<String> = storage
        .list(Path::new(&content_dir))?
        .into_iter()
        .filter_map(|name| name.strip_suffix(extension).map(str::to_string))
        .collect();

    scenes.sort();
    scenes.dedup();
    debug!("Found {} scene shards in {}", scenes.len(), content_dir);
    Ok(scenes)
}
