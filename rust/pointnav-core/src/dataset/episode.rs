// rust/pointnav-core/src/dataset/episode.rs

//! Typed navigation episode records.
//!
//! Records are built straight from the dataset JSON. Unknown keys are
//! rejected so a schema drift in the dataset surfaces as a deserialization
//! error instead of silently dropped data.

use serde::{Deserialize, Deserializer, Serialize};

/// One navigation task: reach any of `goals` from the start pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavigationEpisode {
    #[serde(deserialize_with = "string_or_number")]
    pub episode_id: String,
    /// Path of the scene asset. Rewritten against the local asset root on load.
    pub scene_id: String,
    #[serde(default = "default_scene_dataset_config")]
    pub scene_dataset_config: String,
    #[serde(default)]
    pub additional_obj_config_paths: Vec<String>,
    pub start_position: Vec<f32>,
    /// Quaternion as stored in the dataset.
    pub start_rotation: Vec<f32>,
    #[serde(default)]
    pub info: Option<serde_json::Map<String, serde_json::Value>>,
    pub goals: Vec<NavigationGoal>,
    #[serde(default)]
    pub start_room: Option<String>,
    /// Precomputed traces; `None` when they were never computed.
    #[serde(default)]
    pub shortest_paths: Option<Vec<Vec<ShortestPathPoint>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavigationGoal {
    pub position: Vec<f32>,
    #[serde(default)]
    pub radius: Option<f32>,
}

/// One waypoint of a precomputed shortest path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShortestPathPoint {
    pub position: Vec<f32>,
    pub rotation: Vec<f32>,
    #[serde(default)]
    pub action: Option<PathAction>,
}

/// Action taken at a waypoint: a discrete action index or a continuous command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathAction {
    Discrete(i64),
    Continuous(Vec<f32>),
}

fn default_scene_dataset_config() -> String {
    "default".to_string()
}

// Older datasets store numeric episode ids.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}
