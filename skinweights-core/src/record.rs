//! The persisted skin binding record (`.skinData` JSON).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkinError};
use crate::geometry::{parse_key, parse_weights, QuantKey};

/// Suffix the record writer guarantees on every file it saves.
pub const SKIN_FILE_EXT: &str = ".skinData";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum SkinningMethod {
    #[default]
    Classic,
    DualQuaternion,
    WeightBlended,
}

impl TryFrom<i64> for SkinningMethod {
    type Error = String;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(SkinningMethod::Classic),
            1 => Ok(SkinningMethod::DualQuaternion),
            2 => Ok(SkinningMethod::WeightBlended),
            other => Err(format!("unknown skinning method {}", other)),
        }
    }
}

impl From<SkinningMethod> for i64 {
    fn from(method: SkinningMethod) -> Self {
        match method {
            SkinningMethod::Classic => 0,
            SkinningMethod::DualQuaternion => 1,
            SkinningMethod::WeightBlended => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkinRecord {
    pub name: String,
    /// Influence name → weight per vertex, in vertex order at export.
    pub weights: BTreeMap<String, Vec<f64>>,
    pub blend_weights: Vec<f64>,
    /// Quantized position key → stringified weight vector, for world-space import.
    #[serde(default)]
    pub world_space: BTreeMap<String, String>,
    /// Influence order of the `world_space` weight vectors.
    #[serde(default, deserialize_with = "joint_list::deserialize")]
    pub world_space_joints: Vec<String>,
    #[serde(default)]
    pub skinning_method: SkinningMethod,
    #[serde(default = "default_true")]
    pub normalize_weights: bool,
}

fn default_true() -> bool {
    true
}

/// One parsed `worldSpace` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSample {
    pub key: QuantKey,
    pub weights: Vec<f64>,
}

impl SkinRecord {
    /// Vertex count implied by the record, taken from the first weight column.
    pub fn vertex_count(&self) -> usize {
        self.weights
            .values()
            .next()
            .map(Vec::len)
            .unwrap_or(self.blend_weights.len())
    }

    /// Influence order to use when a binding has to be created for this record.
    ///
    /// The capture order wins when it names exactly the recorded influences.
    pub fn influence_order(&self) -> Vec<String> {
        let captured: Vec<&String> = self
            .world_space_joints
            .iter()
            .filter(|j| self.weights.contains_key(*j))
            .collect();
        if captured.len() == self.weights.len() {
            captured.into_iter().cloned().collect()
        } else {
            self.weights.keys().cloned().collect()
        }
    }

    /// Parse every `worldSpace` entry, in record order.
    pub fn world_samples(&self) -> Result<Vec<WorldSample>> {
        self.world_space
            .iter()
            .map(|(key, weights)| {
                Ok(WorldSample { key: parse_key(key)?, weights: parse_weights(weights)? })
            })
            .collect()
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let record: SkinRecord = serde_json::from_str(s)?;
        Ok(record)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Write the record as JSON, appending [`SKIN_FILE_EXT`] when missing.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let path = with_skin_ext(path.as_ref());
        let data = serde_json::to_string(self)?;
        std::fs::write(&path, data)?;
        log::info!(
            "Exported {} ({} influences, {} verts) {}",
            self.name,
            self.weights.len(),
            self.blend_weights.len(),
            path.display()
        );
        Ok(path)
    }

    pub(crate) fn check_vertex_count(&self, expected: usize) -> Result<()> {
        let lengths = self.weights.values().map(Vec::len);
        let blend = (!self.blend_weights.is_empty()).then_some(self.blend_weights.len());
        for found in lengths.chain(blend) {
            if found != expected {
                return Err(SkinError::VertCountMismatch { expected, found });
            }
        }
        Ok(())
    }
}

pub fn with_skin_ext(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if s.ends_with(SKIN_FILE_EXT) {
        path.to_path_buf()
    } else {
        PathBuf::from(format!("{}{}", s, SKIN_FILE_EXT))
    }
}

/// `worldSpaceJoints` was historically written as a stringified list
/// (`"['L_arm', 'R_arm']"`); accept that alongside a plain JSON array.
mod joint_list {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        List(Vec<String>),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Repr::deserialize(d)? {
            Repr::List(list) => list,
            Repr::Text(text) => parse_list_literal(&text),
        })
    }

    fn parse_list_literal(text: &str) -> Vec<String> {
        text.trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(|item| item.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}
