//! The contract between the weight algorithms and whatever owns the live binding.

use std::ops::{Deref, DerefMut};

use glam::DVec3;

use crate::error::Result;
use crate::geometry::GeometryKind;
use crate::record::SkinningMethod;

/// One live binding: a point set, its ordered influences and their weights.
///
/// `set_weights` honours the normalize-on-write flag: while it is on, a host rescales
/// the written row to sum to 1.0. Editors switch it off through [`FlagScope`].
pub trait SkinHost {
    fn name(&self) -> &str;
    fn geometry_kind(&self) -> GeometryKind;
    fn vertex_count(&self) -> usize;
    fn position(&self, vertex: usize) -> DVec3;

    /// Ordered influence names, possibly namespace qualified.
    fn influences(&self) -> &[String];

    fn weights(&self, vertex: usize) -> Vec<f64>;
    fn set_weights(&mut self, vertex: usize, row: &[f64]);

    fn blend_weight(&self, vertex: usize) -> f64;
    fn set_blend_weight(&mut self, vertex: usize, weight: f64);

    fn normalize_weights(&self) -> bool;
    fn set_normalize_weights(&mut self, enabled: bool);
    fn envelope(&self) -> bool;
    fn set_envelope(&mut self, enabled: bool);
    fn skinning_method(&self) -> SkinningMethod;
    fn set_skinning_method(&mut self, method: SkinningMethod);

    /// Generic smoothing fallback for vertices no correspondence could be found for.
    fn smooth_weights(&mut self, vertices: &[usize]);

    fn positions(&self) -> Vec<DVec3> {
        (0..self.vertex_count()).map(|v| self.position(v)).collect()
    }

    fn influence_weights(&self, influence: usize, vertices: &[usize]) -> Vec<f64> {
        vertices.iter().map(|&v| self.weights(v)[influence]).collect()
    }

    fn set_influence_weights(&mut self, influence: usize, vertices: &[usize], values: &[f64]) {
        for (&v, &w) in vertices.iter().zip(values) {
            let mut row = self.weights(v);
            row[influence] = w;
            self.set_weights(v, &row);
        }
    }
}

/// A set of named nodes bindings can be looked up on or created for.
///
/// Lookups fail with `UnknownNode`, `NoShapeConnected` or `NoBindingFound` before
/// anything is touched.
pub trait SkinScene {
    type Binding: SkinHost;

    /// Geometry kind and point count of `node`'s shape.
    fn shape(&self, node: &str) -> Result<(GeometryKind, usize)>;
    fn has_binding(&self, node: &str) -> Result<bool>;
    fn binding(&mut self, node: &str) -> Result<&mut Self::Binding>;
    fn create_binding(
        &mut self,
        node: &str,
        name: &str,
        influences: &[String],
    ) -> Result<&mut Self::Binding>;

    /// Switch every binding's envelope; returns how many bindings were touched.
    fn set_all_envelopes(&mut self, enabled: bool) -> usize;
}

/// Receives completion percentages in `0.0..=100.0`.
pub trait Progress {
    fn report(&mut self, percent: f64);
}

impl<F: FnMut(f64)> Progress for F {
    fn report(&mut self, percent: f64) {
        self(percent)
    }
}

/// Progress sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Progress for Silent {
    fn report(&mut self, _percent: f64) {}
}

/// Report `done / total` as a percentage rounded to two places.
pub fn report_step(progress: &mut dyn Progress, done: usize, total: usize) {
    if total == 0 {
        return;
    }
    let percent = (done as f64 / total as f64 * 10_000.0).round() / 100.0;
    progress.report(percent);
}

/// Turns binding flags off for the lifetime of the scope and restores them on drop,
/// including when the body returns early with an error or panics.
pub struct FlagScope<'a> {
    host: &'a mut dyn SkinHost,
    normalize: Option<bool>,
    envelope: Option<bool>,
}

impl<'a> FlagScope<'a> {
    pub fn without_normalize(host: &'a mut dyn SkinHost) -> Self {
        let normalize = Some(host.normalize_weights());
        host.set_normalize_weights(false);
        Self { host, normalize, envelope: None }
    }

    pub fn without_normalize_or_envelope(host: &'a mut dyn SkinHost) -> Self {
        let mut scope = Self::without_normalize(host);
        scope.envelope = Some(scope.host.envelope());
        scope.host.set_envelope(false);
        scope
    }
}

impl<'a> Deref for FlagScope<'a> {
    type Target = dyn SkinHost + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.host
    }
}

impl<'a> DerefMut for FlagScope<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.host
    }
}

impl Drop for FlagScope<'_> {
    fn drop(&mut self) {
        if let Some(envelope) = self.envelope {
            self.host.set_envelope(envelope);
        }
        if let Some(normalize) = self.normalize {
            self.host.set_normalize_weights(normalize);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryBinding;

    fn binding() -> MemoryBinding {
        MemoryBinding::new("skin", vec![DVec3::ZERO], vec!["a".into(), "b".into()])
    }

    #[test]
    fn flag_scope_restores_on_drop() {
        let mut b = binding();
        b.set_normalize_weights(true);
        b.set_envelope(true);
        {
            let mut scope = FlagScope::without_normalize_or_envelope(&mut b);
            assert!(!scope.normalize_weights());
            assert!(!scope.envelope());
            scope.set_weights(0, &[3.0, 1.0]);
        }
        assert!(b.normalize_weights());
        assert!(b.envelope());
        assert_eq!(b.weights(0), vec![3.0, 1.0]);
    }

    #[test]
    fn flag_scope_restores_on_error_path() {
        fn failing(host: &mut dyn SkinHost) -> Result<()> {
            let _scope = FlagScope::without_normalize(host);
            Err(crate::error::SkinError::NoSelection)
        }
        let mut b = binding();
        b.set_normalize_weights(true);
        assert!(failing(&mut b).is_err());
        assert!(b.normalize_weights());
    }

    #[test]
    fn report_step_rounds_to_hundredths() {
        let mut seen = Vec::new();
        let mut sink = |p: f64| seen.push(p);
        report_step(&mut sink, 1, 3);
        report_step(&mut sink, 3, 3);
        report_step(&mut sink, 1, 0);
        assert_eq!(seen, vec![33.33, 100.0]);
    }
}
