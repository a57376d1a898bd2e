//! Node-level entry points: resolve a selection against a scene, then run one
//! serializer or editor operation on the binding found there.

use std::path::{Path, PathBuf};

use crate::config::SkinConfig;
use crate::editor::{self, MirrorOptions};
use crate::error::{OperationReport, Result, SkinError};
use crate::geometry::Axis;
use crate::host::{Progress, SkinScene};
use crate::influence::apply_namespace;
use crate::record::SkinRecord;
use crate::scene::MemoryBinding;
use crate::serializer::{self, ImportMode};

/// Pick the node an operation applies to: the first selected one.
pub fn resolve(selection: &[String]) -> Result<&str> {
    selection.first().map(String::as_str).ok_or(SkinError::NoSelection)
}

pub fn export_node<S: SkinScene>(scene: &mut S, node: &str, path: &Path) -> Result<PathBuf> {
    let binding = scene.binding(node)?;
    serializer::export_to_path(&*binding, path)
}

/// Import `record` onto `node`, binding the node first when it has no skin yet.
///
/// A new binding takes the record's influences, qualified with `namespace` when one is
/// given. Indexed imports compare vertex counts against the node's shape before the
/// binding is created, so a mismatch leaves the scene untouched.
pub fn import_node<S: SkinScene>(
    scene: &mut S,
    node: &str,
    record: &SkinRecord,
    mode: ImportMode,
    namespace: Option<&str>,
    progress: &mut dyn Progress,
) -> Result<OperationReport> {
    let (_, count) = scene.shape(node)?;
    if mode == ImportMode::Indexed {
        record.check_vertex_count(count)?;
    }

    let binding = if scene.has_binding(node)? {
        scene.binding(node)?
    } else {
        let influences: Vec<String> = record
            .influence_order()
            .iter()
            .map(|name| apply_namespace(namespace.unwrap_or_default(), name))
            .collect();
        log::info!(
            "{}: creating binding {} over {} influences",
            node,
            record.name,
            influences.len()
        );
        scene.create_binding(node, &record.name, &influences)?
    };
    serializer::import(binding, record, mode, progress)
}

pub fn load_and_import<S: SkinScene>(
    scene: &mut S,
    node: &str,
    path: &Path,
    mode: ImportMode,
    namespace: Option<&str>,
    progress: &mut dyn Progress,
) -> Result<OperationReport> {
    let record = SkinRecord::load(path)?;
    import_node(scene, node, &record, mode, namespace, progress)
}

pub fn transfer_node<S: SkinScene>(
    scene: &mut S,
    node: &str,
    source: &str,
    target: &str,
    percent: f64,
    vertices: Option<&[usize]>,
) -> Result<OperationReport> {
    editor::transfer(scene.binding(node)?, source, target, percent, vertices)
}

pub fn mirror_node<S: SkinScene>(
    scene: &mut S,
    node: &str,
    options: &MirrorOptions,
    progress: &mut dyn Progress,
) -> Result<OperationReport> {
    editor::mirror(scene.binding(node)?, options, progress)
}

/// Copy weights from `source`'s binding onto `target`'s by matching positions.
///
/// The source is captured first so both nodes may live in the same scene.
pub fn copy_between<S: SkinScene>(
    scene: &mut S,
    source: &str,
    target: &str,
    axis: Axis,
    progress: &mut dyn Progress,
) -> Result<OperationReport> {
    let from = MemoryBinding::capture(&*scene.binding(source)?);
    editor::copy_weights(&from, scene.binding(target)?, axis, progress)
}

pub fn toggle_envelopes<S: SkinScene>(scene: &mut S, enabled: bool) -> usize {
    let touched = scene.set_all_envelopes(enabled);
    log::info!("envelope {} on {} bindings", if enabled { "enabled" } else { "disabled" }, touched);
    touched
}

/// Import mode for a run: world space uses the configured threshold unless overridden.
pub fn import_mode(config: &SkinConfig, world: bool, threshold: Option<f64>) -> ImportMode {
    if world {
        ImportMode::WorldSpace { threshold: threshold.unwrap_or(config.import.world_threshold) }
    } else {
        ImportMode::Indexed
    }
}
