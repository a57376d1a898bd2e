//! In-memory reference host: a JSON-serializable scene of named nodes.

use std::collections::BTreeMap;
use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SkinError};
use crate::geometry::GeometryKind;
use crate::host::{SkinHost, SkinScene};
use crate::record::SkinningMethod;
use crate::weights::{normalize, WeightMatrix};

/// Nearest matched neighbours blended by the smoothing fallback.
const SMOOTH_NEIGHBOURS: usize = 4;

fn default_true() -> bool {
    true
}

/// A skin binding together with the points it deforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryBinding {
    pub name: String,
    #[serde(default)]
    pub kind: GeometryKind,
    pub points: Vec<DVec3>,
    pub influences: Vec<String>,
    pub weights: WeightMatrix,
    #[serde(default)]
    pub blend_weights: Vec<f64>,
    #[serde(default = "default_true")]
    pub normalize_weights: bool,
    #[serde(default = "default_true")]
    pub envelope: bool,
    #[serde(default)]
    pub skinning_method: SkinningMethod,
}

impl MemoryBinding {
    /// Bind `points` to `influences`, every vertex fully weighted to the first influence.
    pub fn new(name: impl Into<String>, points: Vec<DVec3>, influences: Vec<String>) -> Self {
        let mut weights = WeightMatrix::zeros(points.len(), influences.len());
        if !influences.is_empty() {
            for v in 0..points.len() {
                weights.set(v, 0, 1.0);
            }
        }
        Self {
            name: name.into(),
            kind: GeometryKind::Mesh,
            blend_weights: vec![0.0; points.len()],
            points,
            influences,
            weights,
            normalize_weights: true,
            envelope: true,
            skinning_method: SkinningMethod::Classic,
        }
    }

    pub fn with_weights(mut self, rows: Vec<Vec<f64>>) -> Result<Self> {
        self.weights = WeightMatrix::from_rows(rows, self.influences.len())?;
        self.validate()?;
        Ok(self)
    }

    /// Owned copy of any host's binding state.
    pub fn capture(host: &dyn SkinHost) -> Self {
        Self {
            name: host.name().to_string(),
            kind: host.geometry_kind(),
            points: host.positions(),
            influences: host.influences().to_vec(),
            weights: WeightMatrix::read(host),
            blend_weights: (0..host.vertex_count()).map(|v| host.blend_weight(v)).collect(),
            normalize_weights: host.normalize_weights(),
            envelope: host.envelope(),
            skinning_method: host.skinning_method(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let n = self.points.len();
        if self.weights.vertex_count() != n {
            return Err(SkinError::MalformedScene(format!(
                "{}: {} weight rows for {} points",
                self.name,
                self.weights.vertex_count(),
                n
            )));
        }
        if n > 0 && self.weights.influence_count() != self.influences.len() {
            return Err(SkinError::MalformedScene(format!(
                "{}: {} weight columns for {} influences",
                self.name,
                self.weights.influence_count(),
                self.influences.len()
            )));
        }
        if !self.blend_weights.is_empty() && self.blend_weights.len() != n {
            return Err(SkinError::MalformedScene(format!(
                "{}: {} blend weights for {} points",
                self.name,
                self.blend_weights.len(),
                n
            )));
        }
        Ok(())
    }

    // Blend weights may be omitted in hand-written scenes.
    fn ensure_blend_weights(&mut self) {
        if self.blend_weights.len() != self.points.len() {
            self.blend_weights.resize(self.points.len(), 0.0);
        }
    }
}

impl SkinHost for MemoryBinding {
    fn name(&self) -> &str {
        &self.name
    }

    fn geometry_kind(&self) -> GeometryKind {
        self.kind
    }

    fn vertex_count(&self) -> usize {
        self.points.len()
    }

    fn position(&self, vertex: usize) -> DVec3 {
        self.points[vertex]
    }

    fn influences(&self) -> &[String] {
        &self.influences
    }

    fn weights(&self, vertex: usize) -> Vec<f64> {
        self.weights.row(vertex).to_vec()
    }

    fn set_weights(&mut self, vertex: usize, row: &[f64]) {
        let mut row: Vec<f64> = row
            .iter()
            .copied()
            .chain(std::iter::repeat(0.0))
            .take(self.influences.len())
            .collect();
        if self.normalize_weights {
            normalize(&mut row);
        }
        self.weights.set_row(vertex, &row);
    }

    fn blend_weight(&self, vertex: usize) -> f64 {
        self.blend_weights.get(vertex).copied().unwrap_or(0.0)
    }

    fn set_blend_weight(&mut self, vertex: usize, weight: f64) {
        self.ensure_blend_weights();
        self.blend_weights[vertex] = weight;
    }

    fn normalize_weights(&self) -> bool {
        self.normalize_weights
    }

    fn set_normalize_weights(&mut self, enabled: bool) {
        self.normalize_weights = enabled;
    }

    fn envelope(&self) -> bool {
        self.envelope
    }

    fn set_envelope(&mut self, enabled: bool) {
        self.envelope = enabled;
    }

    fn skinning_method(&self) -> SkinningMethod {
        self.skinning_method
    }

    fn set_skinning_method(&mut self, method: SkinningMethod) {
        self.skinning_method = method;
    }

    /// Inverse-distance blend of the nearest vertices outside `vertices`, normalized.
    fn smooth_weights(&mut self, vertices: &[usize]) {
        let mut excluded = vec![false; self.points.len()];
        for &v in vertices {
            excluded[v] = true;
        }
        let donors: Vec<usize> = (0..self.points.len()).filter(|&v| !excluded[v]).collect();
        if donors.is_empty() {
            log::warn!(
                "{}: nothing to smooth from, {} vertices left as-is",
                self.name,
                vertices.len()
            );
            return;
        }

        let mut smoothed = Vec::with_capacity(vertices.len());
        for &v in vertices {
            let p = self.points[v];
            let mut nearest: Vec<(f64, usize)> = donors
                .iter()
                .map(|&d| (self.points[d].distance_squared(p), d))
                .filter(|(dist2, _)| dist2.is_finite())
                .collect();
            if nearest.is_empty() {
                continue;
            }
            nearest.sort_by(|a, b| a.0.total_cmp(&b.0));
            nearest.truncate(SMOOTH_NEIGHBOURS);

            let mut row = vec![0.0; self.influences.len()];
            if nearest[0].0 == 0.0 {
                row.copy_from_slice(self.weights.row(nearest[0].1));
            } else {
                for (dist2, d) in &nearest {
                    let w = 1.0 / dist2.sqrt();
                    for (acc, x) in row.iter_mut().zip(self.weights.row(*d)) {
                        *acc += w * x;
                    }
                }
            }
            normalize(&mut row);
            smoothed.push((v, row));
        }
        for (v, row) in smoothed {
            self.weights.set_row(v, &row);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Shape {
    Unbound { kind: GeometryKind, points: Vec<DVec3> },
    Bound(MemoryBinding),
}

impl Shape {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Shape::Unbound { kind, .. } => *kind,
            Shape::Bound(b) => b.kind,
        }
    }

    pub fn points(&self) -> &[DVec3] {
        match self {
            Shape::Unbound { points, .. } => points,
            Shape::Bound(b) => &b.points,
        }
    }
}

/// A node with no shape stands in for transforms and joints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneNode {
    #[serde(default)]
    pub shape: Option<Shape>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MemoryScene {
    pub nodes: BTreeMap<String, SceneNode>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: impl Into<String>, shape: Option<Shape>) {
        self.nodes.insert(name.into(), SceneNode { shape });
    }

    pub fn add_mesh(&mut self, name: impl Into<String>, points: Vec<DVec3>) {
        self.add_node(name, Some(Shape::Unbound { kind: GeometryKind::Mesh, points }));
    }

    pub fn add_binding(&mut self, name: impl Into<String>, binding: MemoryBinding) {
        self.add_node(name, Some(Shape::Bound(binding)));
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let mut scene: MemoryScene = serde_json::from_str(s)?;
        for node in scene.nodes.values_mut() {
            if let Some(Shape::Bound(b)) = &mut node.shape {
                b.validate()?;
                b.ensure_blend_weights();
            }
        }
        Ok(scene)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    fn node(&self, node: &str) -> Result<&SceneNode> {
        self.nodes.get(node).ok_or_else(|| SkinError::UnknownNode(node.to_string()))
    }

    fn shape_mut(&mut self, node: &str) -> Result<&mut Shape> {
        self.nodes
            .get_mut(node)
            .ok_or_else(|| SkinError::UnknownNode(node.to_string()))?
            .shape
            .as_mut()
            .ok_or_else(|| SkinError::NoShapeConnected(node.to_string()))
    }
}

impl SkinScene for MemoryScene {
    type Binding = MemoryBinding;

    fn shape(&self, node: &str) -> Result<(GeometryKind, usize)> {
        let shape = self
            .node(node)?
            .shape
            .as_ref()
            .ok_or_else(|| SkinError::NoShapeConnected(node.to_string()))?;
        Ok((shape.kind(), shape.points().len()))
    }

    fn has_binding(&self, node: &str) -> Result<bool> {
        Ok(matches!(self.node(node)?.shape, Some(Shape::Bound(_))))
    }

    fn binding(&mut self, node: &str) -> Result<&mut MemoryBinding> {
        match self.shape_mut(node)? {
            Shape::Bound(b) => Ok(b),
            Shape::Unbound { .. } => Err(SkinError::NoBindingFound(node.to_string())),
        }
    }

    fn create_binding(
        &mut self,
        node: &str,
        name: &str,
        influences: &[String],
    ) -> Result<&mut MemoryBinding> {
        let shape = self.shape_mut(node)?;
        if let Shape::Bound(old) = shape {
            log::warn!("{}: replacing existing binding {}", node, old.name);
        }
        let mut binding = MemoryBinding::new(name, shape.points().to_vec(), influences.to_vec());
        binding.kind = shape.kind();
        *shape = Shape::Bound(binding);
        match shape {
            Shape::Bound(b) => Ok(b),
            Shape::Unbound { .. } => Err(SkinError::NoBindingFound(node.to_string())),
        }
    }

    fn set_all_envelopes(&mut self, enabled: bool) -> usize {
        let mut touched = 0;
        for node in self.nodes.values_mut() {
            if let Some(Shape::Bound(b)) = &mut node.shape {
                b.envelope = enabled;
                touched += 1;
            }
        }
        touched
    }
}
