//! Export a live binding to a [`SkinRecord`] and import one back.

use std::path::{Path, PathBuf};

use crate::error::{OperationReport, Result, SkinError};
use crate::geometry::{dequantize, format_key, format_weights, quantize, SpatialIndex};
use crate::host::{report_step, FlagScope, Progress, SkinHost};
use crate::influence::{find_influence, strip_namespace};
use crate::record::SkinRecord;
use crate::weights::WeightMatrix;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImportMode {
    /// Vertex `i` of the record goes to vertex `i` of the binding.
    Indexed,
    /// Match vertices by quantized world position, then within `threshold` per axis.
    WorldSpace { threshold: f64 },
}

/// Capture the binding's full weight state.
pub fn export(host: &dyn SkinHost) -> SkinRecord {
    let matrix = WeightMatrix::read(host);
    let joints: Vec<String> = host.influences().iter().map(|n| strip_namespace(n)).collect();

    let mut record = SkinRecord {
        name: host.name().to_string(),
        world_space_joints: joints.clone(),
        skinning_method: host.skinning_method(),
        normalize_weights: host.normalize_weights(),
        ..Default::default()
    };

    for (i, joint) in joints.iter().enumerate() {
        if record.weights.insert(joint.clone(), matrix.column(i)).is_some() {
            log::warn!(
                "{}: influence name {} is ambiguous once namespaces are stripped",
                record.name,
                joint
            );
        }
    }
    record.blend_weights = (0..host.vertex_count()).map(|v| host.blend_weight(v)).collect();

    let positions = host.positions();
    for (v, p) in positions.iter().enumerate() {
        let key = format_key(quantize(*p));
        record.world_space.insert(key, format_weights(matrix.row(v)));
    }
    let index = SpatialIndex::from_points(&positions);
    if !index.is_empty() {
        log::debug!(
            "{}: {} vertices on {} position keys",
            record.name,
            positions.len(),
            index.len()
        );
    }
    let collisions = index.collisions();
    if collisions > 0 {
        log::warn!(
            "{}: {} position keys are shared by several vertices; \
             world-space data keeps the last one",
            record.name,
            collisions
        );
    }
    record
}

/// Export and write to `path`, returning the path actually written.
pub fn export_to_path<P: AsRef<Path>>(host: &dyn SkinHost, path: P) -> Result<PathBuf> {
    export(host).save(path)
}

pub fn import(
    host: &mut dyn SkinHost,
    record: &SkinRecord,
    mode: ImportMode,
    progress: &mut dyn Progress,
) -> Result<OperationReport> {
    let report = match mode {
        ImportMode::Indexed => import_indexed(host, record, progress)?,
        ImportMode::WorldSpace { threshold } => import_world(host, record, threshold, progress)?,
    };
    report.log_gaps("import");
    Ok(report)
}

/// Write every recorded weight column and blend weight by vertex index.
///
/// Fails with `VertCountMismatch` before touching the binding when the record was
/// captured from a different vertex count.
pub fn import_indexed(
    host: &mut dyn SkinHost,
    record: &SkinRecord,
    progress: &mut dyn Progress,
) -> Result<OperationReport> {
    record.check_vertex_count(host.vertex_count())?;

    let mut report = OperationReport::default();
    let mut matrix = WeightMatrix::read(host);
    progress.report(0.0);
    let total = record.weights.len();
    for (done, (name, column)) in record.weights.iter().enumerate() {
        match find_influence(host.influences(), name) {
            Some(i) => matrix.set_column(i, column),
            None => report.unmatched_influence(name.as_str()),
        }
        report_step(progress, done + 1, total);
    }

    {
        let mut scope = FlagScope::without_normalize(host);
        let all: Vec<usize> = (0..matrix.vertex_count()).collect();
        matrix.write_rows(&mut *scope, &all);
        for (v, w) in record.blend_weights.iter().enumerate() {
            scope.set_blend_weight(v, *w);
        }
        report.written = all.len();
    }
    host.set_skinning_method(record.skinning_method);
    host.set_normalize_weights(record.normalize_weights);
    progress.report(100.0);
    log::info!("Imported {} onto {} ({} verts)", record.name, host.name(), report.written);
    Ok(report)
}

/// Map the columns of the record's world-space vectors onto live influence indices.
fn world_columns(
    host: &dyn SkinHost,
    record: &SkinRecord,
    report: &mut OperationReport,
) -> Vec<Option<usize>> {
    if record.world_space_joints.is_empty() {
        return (0..host.influences().len()).map(Some).collect();
    }
    record
        .world_space_joints
        .iter()
        .map(|joint| {
            let hit = find_influence(host.influences(), joint);
            if hit.is_none() {
                report.unmatched_influence(joint.as_str());
            }
            hit
        })
        .collect()
}

/// Match live vertices to recorded positions and copy their weight vectors.
///
/// An exact quantized-key hit always wins. Otherwise, with `threshold > 0`, the record
/// is scanned in order and the first not-yet-used entry within `threshold` on every
/// axis is taken. Vertices with a non-finite coordinate never match. Whatever stays
/// unmatched is handed to the host's smoothing fallback.
pub fn import_world(
    host: &mut dyn SkinHost,
    record: &SkinRecord,
    threshold: f64,
    progress: &mut dyn Progress,
) -> Result<OperationReport> {
    let samples = record.world_samples()?;
    let mut report = OperationReport::default();
    let columns = world_columns(host, record, &mut report);
    if !record.world_space_joints.is_empty() {
        if let Some(bad) = samples.iter().find(|s| s.weights.len() != columns.len()) {
            return Err(SkinError::MalformedRecord(format!(
                "world-space vector {} has {} weights for {} joints",
                format_key(bad.key),
                bad.weights.len(),
                columns.len()
            )));
        }
    }

    let mut index = SpatialIndex::new();
    for (s, sample) in samples.iter().enumerate() {
        index.insert(sample.key, s);
    }
    let mut used = vec![false; samples.len()];

    let mut matrix = WeightMatrix::read(host);
    let mut matched = Vec::new();
    let count = host.vertex_count();
    progress.report(0.0);
    for v in 0..count {
        let position = host.position(v);
        if !position.is_finite() {
            report.unmatched_vertex(v);
            report_step(progress, v + 1, count);
            continue;
        }
        let key = quantize(position);
        let mut hit = index.get(&key).first().copied();
        if hit.is_none() && threshold > 0.0 {
            let here = dequantize(key);
            hit = samples.iter().enumerate().position(|(s, sample)| {
                let d = (dequantize(sample.key) - here).abs();
                !used[s] && d.x < threshold && d.y < threshold && d.z < threshold
            });
        }

        match hit {
            Some(s) => {
                used[s] = true;
                let row = matrix.row_mut(v);
                row.fill(0.0);
                for (k, w) in samples[s].weights.iter().enumerate() {
                    if let Some(Some(i)) = columns.get(k) {
                        row[*i] = *w;
                    }
                }
                matched.push(v);
            }
            None => report.unmatched_vertex(v),
        }
        report_step(progress, v + 1, count);
    }

    {
        let mut scope = FlagScope::without_normalize(host);
        matrix.write_rows(&mut *scope, &matched);
    }
    report.written = matched.len();

    if !report.unmatched_vertices.is_empty() {
        log::info!(
            "No match for {} vertices, applying automatic weighting to them",
            report.unmatched_vertices.len()
        );
        host.smooth_weights(&report.unmatched_vertices);
    }
    progress.report(100.0);
    Ok(report)
}
