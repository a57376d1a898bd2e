//! Axes, geometry kinds, position quantization and the quantized spatial index.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SkinError};

/// Decimal places kept when a position is turned into a lookup key.
pub const QUANTIZE_DECIMALS: u32 = 3;
const QUANTIZE_SCALE: f64 = 1000.0;

/// Integer lattice coordinates of a quantized position.
pub type QuantKey = [i64; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn component(self, p: DVec3) -> f64 {
        p[self.index()]
    }

    /// Reflect `p` across the plane through the origin perpendicular to this axis.
    pub fn reflect(self, p: DVec3) -> DVec3 {
        let mut out = p;
        out[self.index()] = -out[self.index()];
        out
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(s)
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            other => Err(format!("unknown axis '{}', expected x, y or z", other)),
        }
    }
}

/// What kind of deformable geometry a binding drives. Resolved once when a node is
/// looked up; the algorithms only care about the point list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    #[default]
    Mesh,
    Curve,
    Surface,
}

impl GeometryKind {
    /// Component name used when addressing single points (`body.vtx[3]`).
    pub fn component_name(self) -> &'static str {
        match self {
            GeometryKind::Mesh => "vtx",
            GeometryKind::Curve | GeometryKind::Surface => "cv",
        }
    }
}

/// Truncate each coordinate toward zero at [`QUANTIZE_DECIMALS`] places.
pub fn quantize(p: DVec3) -> QuantKey {
    [
        (p.x * QUANTIZE_SCALE).trunc() as i64,
        (p.y * QUANTIZE_SCALE).trunc() as i64,
        (p.z * QUANTIZE_SCALE).trunc() as i64,
    ]
}

pub fn dequantize(key: QuantKey) -> DVec3 {
    DVec3::new(
        key[0] as f64 / QUANTIZE_SCALE,
        key[1] as f64 / QUANTIZE_SCALE,
        key[2] as f64 / QUANTIZE_SCALE,
    )
}

/// Render a quantized position as a persisted key, e.g. `[1.0, 0.0, -0.5]`.
pub fn format_key(key: QuantKey) -> String {
    let p = dequantize(key);
    format!("[{:?}, {:?}, {:?}]", p.x, p.y, p.z)
}

/// Parse a persisted key back onto the integer lattice.
///
/// Keys hold already-quantized values, so they are rounded rather than truncated.
pub fn parse_key(key: &str) -> Result<QuantKey> {
    let values: Vec<f64> = serde_json::from_str(key)
        .map_err(|e| SkinError::MalformedRecord(format!("position key {:?}: {}", key, e)))?;
    match values.as_slice() {
        [x, y, z] => Ok([
            (x * QUANTIZE_SCALE).round() as i64,
            (y * QUANTIZE_SCALE).round() as i64,
            (z * QUANTIZE_SCALE).round() as i64,
        ]),
        _ => Err(SkinError::MalformedRecord(format!(
            "position key {:?} has {} components",
            key,
            values.len()
        ))),
    }
}

pub fn format_weights(row: &[f64]) -> String {
    let parts: Vec<String> = row.iter().map(|w| format!("{:?}", w)).collect();
    format!("[{}]", parts.join(", "))
}

pub fn parse_weights(s: &str) -> Result<Vec<f64>> {
    serde_json::from_str(s)
        .map_err(|e| SkinError::MalformedRecord(format!("weight vector {:?}: {}", s, e)))
}

/// Quantized-position lookup that keeps every item landing on a key.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    cells: HashMap<QuantKey, Vec<usize>>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: &[DVec3]) -> Self {
        let mut index = Self::new();
        for (i, p) in points.iter().enumerate() {
            index.insert(quantize(*p), i);
        }
        index
    }

    pub fn insert(&mut self, key: QuantKey, item: usize) {
        self.cells.entry(key).or_default().push(item);
    }

    pub fn get(&self, key: &QuantKey) -> &[usize] {
        self.cells.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of keys that more than one item quantized onto.
    pub fn collisions(&self) -> usize {
        self.cells.values().filter(|items| items.len() > 1).count()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_truncates_toward_zero() {
        assert_eq!(quantize(DVec3::new(1.23456, -1.23456, 0.0009)), [1234, -1234, 0]);
    }

    #[test]
    fn key_formatting_matches_persisted_layout() {
        assert_eq!(format_key([1000, 0, -500]), "[1.0, 0.0, -0.5]");
        assert_eq!(format_key([1, -2, 3]), "[0.001, -0.002, 0.003]");
    }

    #[test]
    fn parse_key_accepts_integer_and_float_forms() {
        assert_eq!(parse_key("[1.0, 0.0, -0.5]").unwrap(), [1000, 0, -500]);
        assert_eq!(parse_key("[1, 0, 2]").unwrap(), [1000, 0, 2000]);
        assert!(parse_key("[1.0, 2.0]").is_err());
        assert!(parse_key("not a key").is_err());
    }

    #[test]
    fn spatial_index_keeps_coincident_points() {
        let points = [
            DVec3::new(0.5, 0.0, 0.0),
            DVec3::new(0.5001, 0.0, 0.0),
            DVec3::new(-0.5, 0.0, 0.0),
        ];
        let index = SpatialIndex::from_points(&points);
        assert_eq!(index.get(&[500, 0, 0]), &[0, 1]);
        assert_eq!(index.get(&[-500, 0, 0]), &[2]);
        assert!(index.get(&[0, 0, 0]).is_empty());
        assert_eq!(index.collisions(), 1);
        assert_eq!(index.len(), 2);
        assert!(SpatialIndex::new().is_empty());
    }

    #[test]
    fn component_names_follow_geometry_kind() {
        assert_eq!(GeometryKind::Mesh.component_name(), "vtx");
        assert_eq!(GeometryKind::Curve.component_name(), "cv");
        assert_eq!(GeometryKind::Surface.component_name(), "cv");
    }

    #[test]
    fn axis_reflects_only_its_component() {
        let p = DVec3::new(1.0, 2.0, 3.0);
        assert_eq!(Axis::Y.reflect(p), DVec3::new(1.0, -2.0, 3.0));
        assert_eq!("Z".parse::<Axis>().unwrap(), Axis::Z);
        assert!("w".parse::<Axis>().is_err());
    }
}
