//! PointNav dataset inspection tool
//!
//! Loads a PointNav episode dataset the same way a simulator would and
//! reports what it finds.
//!
//! # Usage
//!
//! ```bash
//! # Check that the dataset and scene assets are installed
//! pointnav --split val check
//!
//! # List the scenes of a split
//! pointnav --config dataset.toml scenes
//!
//! # Load two scenes and dump their episodes as JSON
//! pointnav --split val --content-scenes Adrian,Cantwell load --json
//! ```

mod registry;

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pointnav_core::config::parse_scene_list;
use pointnav_core::{scene_from_scene_path, LoaderConfig, LocalStorage};

/// PointNav episode dataset inspector
#[derive(Parser, Debug)]
#[command(name = "pointnav")]
#[command(about = "Inspect PointNav episode datasets")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset type to load
    #[arg(long, default_value = "PointNav-v1")]
    dataset_type: String,

    /// Combined dataset file template, e.g. data/datasets/pointnav/gibson/v1/{split}/{split}.json.gz
    #[arg(long)]
    data_path: Option<String>,

    /// Split to load
    #[arg(short, long)]
    split: Option<String>,

    /// Local root of the scene assets
    #[arg(long)]
    scenes_dir: Option<PathBuf>,

    /// Comma separated scenes to load ("*" for all)
    #[arg(long)]
    content_scenes: Option<String>,

    /// Root that relative paths are resolved against
    #[arg(long)]
    root: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report whether the dataset file and scene assets exist
    Check,
    /// List the scenes available in the split
    Scenes,
    /// Load the dataset and summarize it
    Load {
        /// Print the loaded episodes as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

impl Args {
    fn loader_config(&self) -> pointnav_core::Result<LoaderConfig> {
        let mut config = match &self.config {
            Some(path) => LoaderConfig::from_file(path)?,
            None => LoaderConfig::default(),
        }
        .with_env_overrides();

        if let Some(data_path) = &self.data_path {
            config.dataset.data_path = data_path.clone();
        }
        if let Some(split) = &self.split {
            config.dataset.split = split.clone();
        }
        if let Some(scenes_dir) = &self.scenes_dir {
            config.dataset.scenes_dir = scenes_dir.clone();
        }
        if let Some(scenes) = &self.content_scenes {
            config.dataset.content_scenes = parse_scene_list(scenes);
        }
        if let Some(root) = &self.root {
            config.storage.root = root.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let filter = tracing_subscriber::filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let factory = registry::lookup(&args.dataset_type).ok_or_else(|| {
        format!(
            "unknown dataset type '{}', expected one of: {}",
            args.dataset_type,
            registry::names().join(", ")
        )
    })?;

    let config = args.loader_config()?;
    let storage = LocalStorage::new(&config.storage)?;

    tracing::debug!("Dataset type: {}", factory.name);
    tracing::debug!("  Data path: {}", config.dataset.data_path);
    tracing::debug!("  Split: {}", config.dataset.split);
    tracing::debug!("  Scenes dir: {}", config.dataset.scenes_dir.display());

    match args.command {
        Command::Check => {
            let installed = (factory.config_paths_exist)(&config.dataset, &storage)?;
            if installed {
                println!("ok");
            } else {
                tracing::warn!("Dataset or scene assets are missing");
                println!("missing");
                std::process::exit(1);
            }
        }
        Command::Scenes => {
            for scene in (factory.scenes_to_load)(&config.dataset, &storage)? {
                println!("{scene}");
            }
        }
        Command::Load { json } => {
            let dataset = (factory.load)(&config.dataset, &storage)?;
            if json {
                println!("{}", dataset.to_json()?);
            } else {
                let mut per_scene: BTreeMap<String, usize> = BTreeMap::new();
                for episode in dataset.episodes() {
                    *per_scene
                        .entry(scene_from_scene_path(&episode.scene_id))
                        .or_default() += 1;
                }
                for (scene, count) in &per_scene {
                    println!("{scene}\t{count}");
                }
                println!("total\t{}", dataset.num_episodes());
            }
        }
    }

    Ok(())
}
