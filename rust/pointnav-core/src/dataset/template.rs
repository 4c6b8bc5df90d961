// rust/pointnav-core/src/dataset/template.rs

//! Named-placeholder path templates.
//!
//! Dataset locations are written as templates such as
//! `{data_path}/content/{scene}.json.gz`. Placeholders are `{name}`; a
//! doubled brace (`{{` or `}}`) stands for a literal brace. Values that the
//! template does not mention are ignored, while a placeholder without a value
//! is an error.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// Placeholder for the directory holding the combined dataset file.
pub const DATA_PATH: &str = "data_path";
/// Placeholder for a scene identifier.
pub const SCENE: &str = "scene";
/// Placeholder for a split identifier.
pub const SPLIT: &str = "split";

const SCENE_TOKEN: &str = "{scene}";

/// Default location of per-scene shard files.
pub const DEFAULT_CONTENT_SCENES_PATH: &str = "{data_path}/content/{scene}.json.gz";

/// A path with named placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathTemplate(String);

impl PathTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitutes every placeholder from `values`.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::Template` if a placeholder has no value or the
    /// template has an unmatched brace.
    pub fn format(&self, values: &[(&str, &str)]) -> Result<String> {
        format_template(&self.0, values)
    }

    /// Returns the literal text before and after the first `{scene}` token.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::Template` if the template has no `{scene}`.
    pub fn split_scene(&self) -> Result<(&str, &str)> {
        let start = self.0.find(SCENE_TOKEN).ok_or_else(|| {
            DatasetError::template(&self.0, "template has no {scene} placeholder")
        })?;
        Ok((&self.0[..start], &self.0[start + SCENE_TOKEN.len()..]))
    }

    /// Resolves the directory part in front of `{scene}`, substituting only
    /// `{data_path}`.
    ///
    /// Without a `{scene}` token the whole template is treated as the prefix.
    pub fn scene_dir(&self, data_path: &str) -> Result<String> {
        let prefix = match self.0.find(SCENE_TOKEN) {
            Some(start) => &self.0[..start],
            None => self.0.as_str(),
        };
        format_template(prefix, &[(DATA_PATH, data_path)])
    }

    /// Resolves the shard file of one scene.
    pub fn shard_path(&self, data_path: &str, scene: &str) -> Result<String> {
        self.format(&[(DATA_PATH, data_path), (SCENE, scene)])
    }
}

impl Default for PathTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_CONTENT_SCENES_PATH)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PathTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl From<String> for PathTemplate {
    fn from(template: String) -> Self {
        Self(template)
    }
}

fn format_template(template: &str, values: &[(&str, &str)]) -> Result<String> {
    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len());
    let mut literal_start = 0;
    let mut i = 0;

    // Braces are ASCII, so every index we slice at is a char boundary.
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                out.push_str(&template[literal_start..i]);
                if bytes.get(i + 1) == Some(&b'{') {
                    out.push('{');
                    i += 2;
                    literal_start = i;
                    continue;
                }

                let close = template[i + 1..]
                    .find('}')
                    .map(|offset| i + 1 + offset)
                    .ok_or_else(|| DatasetError::template(template, "single '{' encountered"))?;
                let name = &template[i + 1..close];
                if name.contains('{') {
                    return Err(DatasetError::template(
                        template,
                        "unexpected '{' in placeholder name",
                    ));
                }

                let value = values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| {
                        DatasetError::template(
                            template,
                            format!("no value for placeholder '{{{name}}}'"),
                        )
                    })?;
                out.push_str(value);

                i = close + 1;
                literal_start = i;
            }
            b'}' => {
                out.push_str(&template[literal_start..i]);
                if bytes.get(i + 1) != Some(&b'}') {
                    return Err(DatasetError::template(template, "single '}' encountered"));
                }
                out.push('}');
                i += 2;
                literal_start = i;
            }
            _ => i += 1,
        }
    }

    out.push_str(&template[literal_start..]);
    Ok(out)
}
