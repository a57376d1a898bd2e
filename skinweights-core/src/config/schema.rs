use serde::{Deserialize, Serialize};

use crate::editor::{MirrorOptions, MirrorSide};
use crate::geometry::Axis;
use crate::influence::SideMarkers;
use crate::weights::DEFAULT_EPSILON;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinConfig {
    pub markers: SideMarkers,
    pub mirror: MirrorConfig,
    pub import: ImportConfig,
    pub normalize: NormalizeConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub axis: Axis,
    pub side: MirrorSide,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Per-axis distance for fuzzy world-space matching; 0 means exact keys only.
    pub world_threshold: f64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { world_threshold: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub epsilon: f64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self { epsilon: DEFAULT_EPSILON }
    }
}

impl SkinConfig {
    pub fn mirror_options(&self) -> MirrorOptions {
        MirrorOptions {
            axis: self.mirror.axis,
            side: self.mirror.side,
            markers: self.markers.clone(),
        }
    }
}
