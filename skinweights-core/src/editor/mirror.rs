//! Mirror weights across a symmetry plane, swapping left/right influences.

use serde::{Deserialize, Serialize};

use crate::error::{OperationReport, Result};
use crate::geometry::Axis;
use crate::host::{report_step, FlagScope, Progress, SkinHost};
use crate::influence::{resolve_pairs, swap_pairs, SideMarkers};
use crate::matcher::{mirror_map, side_of, Side};
use crate::weights::{normalize, WeightMatrix};

/// Which side of the plane receives mirrored weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MirrorSide {
    /// Positive-side vertices take their negative counterpart's weights.
    #[default]
    NegToPos,
    PosToNeg,
    /// Both vertices of a pair take the other's original weights.
    Both,
}

impl MirrorSide {
    fn receives(self, side: Side) -> bool {
        matches!(
            (self, side),
            (MirrorSide::Both, _)
                | (MirrorSide::NegToPos, Side::Positive)
                | (MirrorSide::PosToNeg, Side::Negative)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorOptions {
    pub axis: Axis,
    pub side: MirrorSide,
    pub markers: SideMarkers,
}

/// Mirror the binding's weights across the plane perpendicular to `options.axis`.
///
/// Every receiving vertex gets its counterpart's original row with each left/right
/// influence pair swapped. On-plane vertices swap their own row and are renormalized.
/// Rows are read from a snapshot taken before any write, so the result does not depend
/// on pair order. Normalize and envelope are off for the duration.
pub fn mirror(
    host: &mut dyn SkinHost,
    options: &MirrorOptions,
    progress: &mut dyn Progress,
) -> Result<OperationReport> {
    let mut scope = FlagScope::without_normalize_or_envelope(host);

    let positions = scope.positions();
    let map = mirror_map(&positions, options.axis);
    let pairs = resolve_pairs(scope.influences(), &options.markers);
    log::debug!(
        "mirroring {} across {} with {} influence pairs",
        scope.name(),
        options.axis,
        pairs.len()
    );

    let snapshot = WeightMatrix::read(&*scope);
    let mut live = snapshot.clone();
    let mut written = Vec::new();
    let mut receive = |dst: usize, src: usize, renormalize: bool| {
        let row = live.row_mut(dst);
        row.copy_from_slice(snapshot.row(src));
        swap_pairs(row, &pairs);
        if renormalize {
            normalize(row);
        }
        written.push(dst);
    };

    let total = map.pairs.len() + map.on_plane.len();
    for (done, &(pos, neg)) in map.pairs.iter().enumerate() {
        if options.side.receives(Side::Positive) {
            receive(pos, neg, false);
        }
        if options.side.receives(Side::Negative) {
            receive(neg, pos, false);
        }
        report_step(progress, done + 1, total);
    }
    for (done, &v) in map.on_plane.iter().enumerate() {
        receive(v, v, true);
        report_step(progress, map.pairs.len() + done + 1, total);
    }

    written.sort_unstable();
    written.dedup();
    live.write_rows(&mut *scope, &written);

    let mut report = OperationReport { written: written.len(), ..Default::default() };
    for &v in &map.unmatched {
        if side_of(positions[v], options.axis).map_or(true, |side| options.side.receives(side)) {
            report.unmatched_vertex(v);
        }
    }
    report.log_gaps("mirror");
    Ok(report)
}
