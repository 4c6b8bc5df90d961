//! Name-based lookup of dataset loaders.

use pointnav_core::storage::StorageBackend;
use pointnav_core::{DatasetConfig, PointNavDataset, Result};

/// Loader entry points for one dataset type.
pub struct DatasetFactory {
    pub name: &'static str,
    pub load: fn(&DatasetConfig, &dyn StorageBackend) -> Result<PointNavDataset>,
    pub scenes_to_load: fn(&DatasetConfig, &dyn StorageBackend) -> Result<Vec<String>>,
    pub config_paths_exist: fn(&DatasetConfig, &dyn StorageBackend) -> Result<bool>,
}

const DATASETS: &[DatasetFactory] = &[DatasetFactory {
    name: "PointNav-v1",
    load: PointNavDataset::load,
    scenes_to_load: PointNavDataset::scenes_to_load,
    config_paths_exist: PointNavDataset::config_paths_exist,
}];

/// Finds the factory registered under `name`.
pub fn lookup(name: &str) -> Option<&'static DatasetFactory> {
    DATASETS.iter().find(|factory| factory.name == name)
}

/// Names of every known dataset type.
pub fn names() -> Vec<&'static str> {
    DATASETS.iter().map(|factory| factory.name).collect()
}
