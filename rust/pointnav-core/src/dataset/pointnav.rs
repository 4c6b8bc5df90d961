// rust/pointnav-core/src/dataset/pointnav.rs

//! PointNav episode dataset.
//!
//! A split is stored either as one combined file or as a combined file plus
//! one shard file per scene. The layout is detected from disk: if the shard
//! directory named by the content-scenes template exists next to the combined
//! file, the split is sharded.
//!
//! ```text
//! <data_path>/<split>/<split>.json.gz          combined file
//! <data_path>/<split>/content/<scene>.json.gz  shard files (optional)
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{DatasetConfig, SceneSelection};
use crate::error::{DatasetError, Result};
use crate::storage::StorageBackend;

use super::discovery::scenes_in_folder;
use super::episode::NavigationEpisode;
use super::parser::{read_document, EpisodeDocument};
use super::template::{PathTemplate, SPLIT};

/// Ordered collection of navigation episodes plus the shard location template.
///
/// Episodes keep the order they were read in: combined file first, then each
/// shard in load order.
#[derive(Debug, Clone, Default)]
pub struct PointNavDataset {
    episodes: Vec<NavigationEpisode>,
    content_scenes_path: PathTemplate,
}

/// Resolved location of a split's combined file.
#[derive(Debug, Clone)]
struct DatasetLocation {
    file: String,
    dir: String,
}

impl DatasetLocation {
    /// Resolves the combined file of `config.split` and checks that its
    /// directory exists.
    fn resolve(config: &DatasetConfig, storage: &dyn StorageBackend) -> Result<Self> {
        let file = dataset_file(config)?;
        let dir = match Path::new(&file).parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
            _ => ".".to_string(),
        };

        if !storage.exists(Path::new(&dir))? {
            return Err(DatasetError::not_found(dir));
        }

        Ok(Self { file, dir })
    }
}

impl PointNavDataset {
    /// Creates an empty dataset with the default shard template.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the split described by `config`.
    ///
    /// Scene paths are rewritten against `config.scenes_dir`. For a sharded
    /// split the requested scene shards are appended after the combined
    /// file's episodes, in request order (sorted order for "*"). For a
    /// combined-only split the episodes are filtered down to the requested
    /// scenes.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::NotFound` if the split directory is missing,
    /// and propagates any storage, template or deserialization error. Nothing
    /// is returned on failure.
    pub fn load(config: &DatasetConfig, storage: &dyn StorageBackend) -> Result<Self> {
        let location = DatasetLocation::resolve(config, storage)?;
        let scenes_dir = Some(config.scenes_dir.as_path());

        let mut dataset = Self::new();
        dataset.extend_from_file(storage, &location.file, scenes_dir)?;

        let selection = config.scene_selection();
        if dataset.has_scene_shards(storage, &location.dir)? {
            let scenes = match selection {
                SceneSelection::All => {
                    scenes_in_folder(storage, &dataset.content_scenes_path, &location.dir)?
                }
                SceneSelection::Only(scenes) => scenes,
            };
            debug!("Loading {} scene shards from {}", scenes.len(), location.dir);

            for scene in &scenes {
                let shard = dataset.content_scenes_path.shard_path(&location.dir, scene)?;
                dataset.extend_from_file(storage, &shard, scenes_dir)?;
            }
        } else {
            let before = dataset.episodes.len();
            dataset
                .episodes
                .retain(|episode| selection.contains(&scene_from_scene_path(&episode.scene_id)));
            debug!(
                "Kept {} of {} episodes after scene filter",
                dataset.episodes.len(),
                before
            );
        }

        info!(
            "Loaded {} episodes for split '{}'",
            dataset.episodes.len(),
            config.split
        );
        Ok(dataset)
    }

    /// Lists the scenes a load of `config` could select from.
    ///
    /// For a sharded split these are the shard files; otherwise the combined
    /// file is read and the scene of every episode is reported once.
    ///
    /// # Errors
    ///
    /// Same as [`PointNavDataset::load`].
    pub fn scenes_to_load(config: &DatasetConfig, storage: &dyn StorageBackend) -> Result<Vec<String>> {
        let location = DatasetLocation::resolve(config, storage)?;

        let mut dataset = Self::new();
        dataset.extend_from_file(storage, &location.file, Some(config.scenes_dir.as_path()))?;

        if dataset.has_scene_shards(storage, &location.dir)? {
            scenes_in_folder(storage, &dataset.content_scenes_path, &location.dir)
        } else {
            Ok(dataset
                .scene_ids()
                .iter()
                .map(|scene_id| scene_from_scene_path(scene_id))
                .collect())
        }
    }

    /// Returns true if both the combined file and the scene asset root exist.
    pub fn config_paths_exist(config: &DatasetConfig, storage: &dyn StorageBackend) -> Result<bool> {
        let file = dataset_file(config)?;
        Ok(storage.exists(Path::new(&file))? && storage.exists(&config.scenes_dir)?)
    }

    /// Appends the episodes of one JSON document.
    ///
    /// A `content_scenes_path` in the document replaces the current shard
    /// template. With `scenes_dir` set, scene paths are rewritten against it.
    ///
    /// # Returns
    ///
    /// The number of episodes appended.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::Deserialization` if the document is invalid; the
    /// dataset is left unchanged in that case.
    pub fn from_json(&mut self, json: &str, scenes_dir: Option<&Path>) -> Result<usize> {
        let document = EpisodeDocument::parse(json, Path::new("<json>"))?;
        Ok(self.append(document, scenes_dir))
    }

    fn extend_from_file(
        &mut self,
        storage: &dyn StorageBackend,
        path: &str,
        scenes_dir: Option<&Path>,
    ) -> Result<usize> {
        let path = Path::new(path);
        let json = read_document(storage, path)?;
        let document = EpisodeDocument::parse(&json, path)?;
        let added = self.append(document, scenes_dir);
        debug!("Read {} episodes from {}", added, path.display());
        Ok(added)
    }

    fn append(&mut self, mut document: EpisodeDocument, scenes_dir: Option<&Path>) -> usize {
        if let Some(template) = document.content_scenes_path.take() {
            self.content_scenes_path = template;
        }
        document.rebase_scenes(scenes_dir);

        let added = document.episodes.len();
        self.episodes.append(&mut document.episodes);
        added
    }

    fn has_scene_shards(&self, storage: &dyn StorageBackend, dataset_dir: &str) -> Result<bool> {
        let content_dir = self.content_scenes_path.scene_dir(dataset_dir)?;
        storage.exists(Path::new(&content_dir))
    }

    pub fn episodes(&self) -> &[NavigationEpisode] {
        &self.episodes
    }

    pub fn into_episodes(self) -> Vec<NavigationEpisode> {
        self.episodes
    }

    pub fn num_episodes(&self) -> usize {
        self.episodes.len()
    }

    pub fn content_scenes_path(&self) -> &PathTemplate {
        &self.content_scenes_path
    }

    /// Distinct scene paths, sorted.
    pub fn scene_ids(&self) -> Vec<String> {
        self.episodes
            .iter()
            .map(|episode| episode.scene_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Episodes of one scene path, in dataset order.
    pub fn scene_episodes(&self, scene_id: &str) -> Vec<&NavigationEpisode> {
        self.episodes
            .iter()
            .filter(|episode| episode.scene_id == scene_id)
            .collect()
    }

    /// Returns a new dataset holding the episodes matching `predicate`.
    pub fn filter_episodes<F>(&self, predicate: F) -> Self
    where
        F: Fn(&NavigationEpisode) -> bool,
    {
        Self {
            episodes: self
                .episodes
                .iter()
                .filter(|&episode| predicate(episode))
                .cloned()
                .collect(),
            content_scenes_path: self.content_scenes_path.clone(),
        }
    }

    /// Serializes the dataset in the on-disk document format.
    pub fn to_json(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Document<'a> {
            episodes: &'a [NavigationEpisode],
            content_scenes_path: &'a PathTemplate,
        }

        serde_json::to_string(&Document {
            episodes: &self.episodes,
            content_scenes_path: &self.content_scenes_path,
        })
        .map_err(|e| DatasetError::serialization(format!("failed to serialize dataset: {e}")))
    }
}

fn dataset_file(config: &DatasetConfig) -> Result<String> {
    PathTemplate::new(config.data_path.as_str()).format(&[(SPLIT, config.split.as_str())])
}

/// Scene identifier of a scene path: its file name without extension.
pub fn scene_from_scene_path(scene_path: &str) -> String {
    Path::new(scene_path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::storage::LocalStorage;
    use serde_json::{json, Value};
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const DATA_PATH: &str = "pointnav/v1/{split}/{split}.json.gz";

    struct Fixture {
        temp: TempDir,
        storage: LocalStorage,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let storage = LocalStorage::new(&StorageConfig {
                root: temp.path().to_path_buf(),
                ..Default::default()
            })
            .unwrap();
            Self { temp, storage }
        }

        fn config(&self, scenes: &[&str]) -> DatasetConfig {
            DatasetConfig {
                data_path: DATA_PATH.to_string(),
                split: "val".to_string(),
                scenes_dir: PathBuf::from("data/scene_datasets"),
                content_scenes: scenes.iter().map(|s| s.to_string()).collect(),
            }
        }

        fn write_gz(&self, relative: &str, document: &Value) {
            let path = self.temp.path().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            let file = File::create(path).unwrap();
            let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            encoder.write_all(document.to_string().as_bytes()).unwrap();
            encoder.finish().unwrap();
        }

        fn write_combined(&self, document: &Value) {
            self.write_gz("pointnav/v1/val/val.json.gz", document);
        }

        fn write_shard(&self, scene: &str, document: &Value) {
            self.write_gz(&format!("pointnav/v1/val/content/{scene}.json.gz"), document);
        }
    }

    fn episode(id: &str, scene_id: &str) -> Value {
        json!({
            "episode_id": id,
            "scene_id": scene_id,
            "start_position": [0.0, 0.0, 0.0],
            "start_rotation": [0.0, 0.0, 0.0, 1.0],
            "info": {"geodesic_distance": 1.5},
            "goals": [{"position": [1.0, 0.0, 1.0], "radius": 0.2}],
            "shortest_paths": null
        })
    }

    fn scene_episodes(scene: &str, count: usize) -> Value {
        let episodes: Vec<_> = (0..count)
            .map(|i| episode(&format!("{scene}-{i}"), &format!("data/scene_datasets/gibson/{scene}.glb")))
            .collect();
        json!({ "episodes": episodes })
    }

    fn ids(dataset: &PointNavDataset) -> Vec<&str> {
        dataset.episodes().iter().map(|e| e.episode_id.as_str()).collect()
    }

    fn sharded_fixture() -> Fixture {
        let fixture = Fixture::new();
        fixture.write_combined(&json!({ "episodes": [] }));
        fixture.write_shard("B", &scene_episodes("B", 2));
        fixture.write_shard("A", &scene_episodes("A", 2));
        fixture.write_shard("C", &scene_episodes("C", 1));
        fixture
    }

    fn monolithic_fixture() -> Fixture {
        let fixture = Fixture::new();
        fixture.write_combined(&json!({
            "episodes": [
                episode("0", "data/scene_datasets/gibson/A.glb"),
                episode("1", "data/scene_datasets/gibson/B.glb"),
                episode("2", "data/scene_datasets/gibson/C.glb"),
                episode("3", "data/scene_datasets/gibson/B.glb"),
            ]
        }));
        fixture
    }

    #[test]
    fn test_monolithic_load_all_in_file_order() {
        let fixture = monolithic_fixture();
        let dataset = PointNavDataset::load(&fixture.config(&["*"]), &fixture.storage).unwrap();

        assert_eq!(ids(&dataset), vec!["0", "1", "2", "3"]);
        assert_eq!(dataset.episodes()[0].scene_id, "data/scene_datasets/gibson/A.glb");
    }

    #[test]
    fn test_monolithic_rewrites_against_scenes_dir() {
        let fixture = monolithic_fixture();
        let mut config = fixture.config(&["*"]);
        config.scenes_dir = PathBuf::from("/mnt/assets");

        let dataset = PointNavDataset::load(&config, &fixture.storage).unwrap();
        assert!(dataset
            .episodes()
            .iter()
            .all(|e| e.scene_id.starts_with("/mnt/assets/gibson/")));
    }

    #[test]
    fn test_monolithic_filter_by_scene_stem() {
        let fixture = monolithic_fixture();
        let dataset = PointNavDataset::load(&fixture.config(&["B"]), &fixture.storage).unwrap();

        assert_eq!(ids(&dataset), vec!["1", "3"]);
    }

    #[test]
    fn test_monolithic_empty_selection_keeps_nothing() {
        let fixture = monolithic_fixture();
        let dataset = PointNavDataset::load(&fixture.config(&[]), &fixture.storage).unwrap();

        assert_eq!(dataset.num_episodes(), 0);
    }

    #[test]
    fn test_monolithic_all_scenes_mask_keeps_everything() {
        // "*" is not a scene name; it selects every scene in a combined file too.
        let fixture = monolithic_fixture();
        let dataset = PointNavDataset::load(&fixture.config(&["B", "*"]), &fixture.storage).unwrap();

        assert_eq!(dataset.num_episodes(), 4);
    }

    #[test]
    fn test_sharded_all_scenes_sorted() {
        let fixture = sharded_fixture();
        let dataset = PointNavDataset::load(&fixture.config(&["*"]), &fixture.storage).unwrap();

        assert_eq!(ids(&dataset), vec!["A-0", "A-1", "B-0", "B-1", "C-0"]);
    }

    #[test]
    fn test_sharded_subset_in_request_order() {
        let fixture = sharded_fixture();
        let dataset = PointNavDataset::load(&fixture.config(&["C", "A"]), &fixture.storage).unwrap();

        assert_eq!(ids(&dataset), vec!["C-0", "A-0", "A-1"]);
        assert!(dataset.episodes().iter().all(|e| !e.scene_id.ends_with("B.glb")));
    }

    #[test]
    fn test_sharded_empty_selection_loads_nothing() {
        let fixture = sharded_fixture();
        let dataset = PointNavDataset::load(&fixture.config(&[]), &fixture.storage).unwrap();

        assert_eq!(dataset.num_episodes(), 0);
    }

    #[test]
    fn test_sharded_keeps_combined_file_episodes_first() {
        let fixture = sharded_fixture();
        fixture.write_combined(&json!({
            "episodes": [episode("combined", "data/scene_datasets/gibson/Z.glb")]
        }));

        let dataset = PointNavDataset::load(&fixture.config(&["B"]), &fixture.storage).unwrap();
        assert_eq!(ids(&dataset), vec!["combined", "B-0", "B-1"]);
    }

    #[test]
    fn test_sharded_missing_shard_fails() {
        let fixture = sharded_fixture();
        let result = PointNavDataset::load(&fixture.config(&["A", "Missing"]), &fixture.storage);

        assert!(matches!(result, Err(DatasetError::Storage { .. })));
    }

    #[test]
    fn test_content_scenes_path_override() {
        let fixture = Fixture::new();
        fixture.write_combined(&json!({
            "episodes": [],
            "content_scenes_path": "{data_path}/per_scene/{scene}.json.gz"
        }));
        fixture.write_gz("pointnav/v1/val/per_scene/A.json.gz", &scene_episodes("A", 1));
        // Not under the overridden directory, so never read.
        fixture.write_shard("B", &scene_episodes("B", 1));

        let dataset = PointNavDataset::load(&fixture.config(&["*"]), &fixture.storage).unwrap();
        assert_eq!(ids(&dataset), vec!["A-0"]);
        assert_eq!(
            dataset.content_scenes_path().as_str(),
            "{data_path}/per_scene/{scene}.json.gz"
        );
    }

    #[test]
    fn test_shard_override_applies_to_following_shards() {
        let fixture = Fixture::new();
        fixture.write_combined(&json!({ "episodes": [] }));

        let mut first = scene_episodes("A", 1);
        first["content_scenes_path"] = json!("{data_path}/relocated/{scene}.json.gz");
        fixture.write_shard("A", &first);
        fixture.write_shard("B", &scene_episodes("Stale", 1));
        fixture.write_gz("pointnav/v1/val/relocated/B.json.gz", &scene_episodes("B", 2));

        let dataset = PointNavDataset::load(&fixture.config(&["A", "B"]), &fixture.storage).unwrap();
        assert_eq!(ids(&dataset), vec!["A-0", "B-0", "B-1"]);
        assert_eq!(
            dataset.content_scenes_path().as_str(),
            "{data_path}/relocated/{scene}.json.gz"
        );
    }

    #[test]
    fn test_missing_dataset_dir_is_not_found() {
        let fixture = Fixture::new();
        let err = PointNavDataset::load(&fixture.config(&["*"]), &fixture.storage).unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("pointnav/v1/val"));
    }

    #[test]
    fn test_missing_combined_file_is_storage_error() {
        let fixture = Fixture::new();
        fs::create_dir_all(fixture.temp.path().join("pointnav/v1/val")).unwrap();

        let err = PointNavDataset::load(&fixture.config(&["*"]), &fixture.storage).unwrap_err();
        assert!(matches!(err, DatasetError::Storage { .. }));
    }

    #[test]
    fn test_document_without_episodes_key() {
        let fixture = Fixture::new();
        fixture.write_combined(&json!({ "content_scenes_path": "{data_path}/content/{scene}.json.gz" }));

        let err = PointNavDataset::load(&fixture.config(&["*"]), &fixture.storage).unwrap_err();
        assert!(err.is_deserialization());
    }

    #[test]
    fn test_episode_without_scene_id() {
        let fixture = Fixture::new();
        let mut broken = episode("0", "unused");
        broken.as_object_mut().unwrap().remove("scene_id");
        fixture.write_combined(&json!({ "episodes": [broken] }));

        let err = PointNavDataset::load(&fixture.config(&["*"]), &fixture.storage).unwrap_err();
        assert!(err.is_deserialization());
    }

    #[test]
    fn test_from_json_failure_appends_nothing() {
        let mut dataset = PointNavDataset::new();
        dataset
            .from_json(&scene_episodes("A", 2).to_string(), None)
            .unwrap();

        let mut broken = scene_episodes("B", 2);
        broken["episodes"][1].as_object_mut().unwrap().remove("goals");

        assert!(dataset.from_json(&broken.to_string(), None).is_err());
        assert_eq!(ids(&dataset), vec!["A-0", "A-1"]);
    }

    #[test]
    fn test_from_json_keeps_template_when_absent() {
        let mut dataset = PointNavDataset::new();
        dataset
            .from_json(
                &json!({"episodes": [], "content_scenes_path": "{data_path}/x/{scene}.gz"}).to_string(),
                None,
            )
            .unwrap();
        dataset.from_json(&json!({"episodes": []}).to_string(), None).unwrap();

        assert_eq!(dataset.content_scenes_path().as_str(), "{data_path}/x/{scene}.gz");
    }

    #[test]
    fn test_scenes_to_load_sharded() {
        let fixture = sharded_fixture();
        let scenes = PointNavDataset::scenes_to_load(&fixture.config(&[]), &fixture.storage).unwrap();

        assert_eq!(scenes, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_scenes_to_load_monolithic() {
        let fixture = monolithic_fixture();
        let scenes = PointNavDataset::scenes_to_load(&fixture.config(&["A"]), &fixture.storage).unwrap();

        assert_eq!(scenes, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_scenes_to_load_missing_dir() {
        let fixture = Fixture::new();
        let err = PointNavDataset::scenes_to_load(&fixture.config(&["*"]), &fixture.storage).unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn test_config_paths_exist() {
        let fixture = monolithic_fixture();
        let mut config = fixture.config(&["*"]);
        assert!(!PointNavDataset::config_paths_exist(&config, &fixture.storage).unwrap());

        fs::create_dir_all(fixture.temp.path().join("assets")).unwrap();
        config.scenes_dir = PathBuf::from("assets");
        assert!(PointNavDataset::config_paths_exist(&config, &fixture.storage).unwrap());
    }

    #[test]
    fn test_scene_helpers() {
        let fixture = monolithic_fixture();
        let dataset = PointNavDataset::load(&fixture.config(&["*"]), &fixture.storage).unwrap();

        assert_eq!(
            dataset.scene_ids(),
            vec![
                "data/scene_datasets/gibson/A.glb",
                "data/scene_datasets/gibson/B.glb",
                "data/scene_datasets/gibson/C.glb",
            ]
        );

        let b: Vec<_> = dataset
            .scene_episodes("data/scene_datasets/gibson/B.glb")
            .into_iter()
            .map(|e| e.episode_id.as_str())
            .collect();
        assert_eq!(b, vec!["1", "3"]);

        let filtered = dataset.filter_episodes(|e| e.episode_id != "1");
        assert_eq!(ids(&filtered), vec!["0", "2", "3"]);
        assert_eq!(dataset.num_episodes(), 4);
    }

    #[test]
    fn test_scene_from_scene_path() {
        assert_eq!(scene_from_scene_path("data/scene_datasets/gibson/Adrian.glb"), "Adrian");
        assert_eq!(scene_from_scene_path("mp3d/17DRP5sb8fy/17DRP5sb8fy.glb"), "17DRP5sb8fy");
        assert_eq!(scene_from_scene_path("replica/apt_0.basis.glb"), "apt_0.basis");
        assert_eq!(scene_from_scene_path(""), "");
    }

    #[test]
    fn test_to_json_reloads() {
        let fixture = monolithic_fixture();
        let dataset = PointNavDataset::load(&fixture.config(&["B"]), &fixture.storage).unwrap();

        let mut reloaded = PointNavDataset::new();
        reloaded.from_json(&dataset.to_json().unwrap(), None).unwrap();

        assert_eq!(reloaded.episodes(), dataset.episodes());
        assert_eq!(reloaded.content_scenes_path(), dataset.content_scenes_path());
    }

    #[test]
    fn test_independent_loads_in_parallel() {
        let sharded = sharded_fixture();
        let monolithic = monolithic_fixture();

        let (a, b) = std::thread::scope(|scope| {
            let a = scope.spawn(|| PointNavDataset::load(&sharded.config(&["*"]), &sharded.storage));
            let b = scope.spawn(|| PointNavDataset::load(&monolithic.config(&["C"]), &monolithic.storage));
            (a.join().unwrap().unwrap(), b.join().unwrap().unwrap())
        });

        assert_eq!(a.num_episodes(), 5);
        assert_eq!(ids(&b), vec!["2"]);
    }
}
