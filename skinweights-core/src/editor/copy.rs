//! Copy weights between two bindings whose vertex order may differ.

use crate::error::{OperationReport, Result};
use crate::geometry::Axis;
use crate::host::{report_step, FlagScope, Progress, SkinHost};
use crate::influence::{find_influence, strip_namespace};
use crate::matcher::correspond;
use crate::weights::WeightMatrix;

/// Give every target vertex the weights of the source vertex at the same position.
///
/// Columns are matched by namespace-stripped influence name. Target vertices without a
/// source counterpart keep their weights and are reported, as are source influences
/// the target does not have.
pub fn copy_weights(
    source: &dyn SkinHost,
    target: &mut dyn SkinHost,
    axis: Axis,
    progress: &mut dyn Progress,
) -> Result<OperationReport> {
    let mut report = OperationReport::default();
    let corr = correspond(&source.positions(), &target.positions(), axis);

    let columns: Vec<Option<usize>> = target
        .influences()
        .iter()
        .map(|name| find_influence(source.influences(), &strip_namespace(name)))
        .collect();
    for (i, name) in source.influences().iter().enumerate() {
        if !columns.contains(&Some(i)) {
            report.unmatched_influence(strip_namespace(name));
        }
    }

    let src = WeightMatrix::read(source);
    let mut dst = WeightMatrix::read(target);
    let mut written = Vec::with_capacity(corr.pairs.len());
    for (done, &(t, s)) in corr.pairs.iter().enumerate() {
        let from = src.row(s);
        for (col, hit) in dst.row_mut(t).iter_mut().zip(&columns) {
            *col = hit.map_or(0.0, |i| from[i]);
        }
        written.push(t);
        report_step(progress, done + 1, corr.pairs.len());
    }

    {
        let mut scope = FlagScope::without_normalize(target);
        dst.write_rows(&mut *scope, &written);
        for &(t, s) in &corr.pairs {
            scope.set_blend_weight(t, source.blend_weight(s));
        }
    }
    report.written = written.len();
    report.unmatched_vertices = corr.unmatched;
    report.log_gaps("copy");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Silent;
    use crate::scene::MemoryBinding;
    use glam::DVec3;

    #[test]
    fn copies_by_position_and_influence_name() {
        let source = MemoryBinding::new(
            "src",
            vec![DVec3::new(1.0, 0.0, 0.0), DVec3::new(-1.0, 0.0, 0.0)],
            vec!["a:L_arm".into(), "a:R_arm".into(), "a:tail".into()],
        )
        .with_weights(vec![vec![0.7, 0.1, 0.2], vec![0.1, 0.9, 0.0]])
        .unwrap();
        let mut target = MemoryBinding::new(
            "dst",
            vec![DVec3::new(-1.0, 0.0, 0.0), DVec3::new(3.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0)],
            vec!["b:R_arm".into(), "b:L_arm".into()],
        );

        let report = copy_weights(&source, &mut target, Axis::X, &mut Silent).unwrap();
        assert_eq!(target.weights(0), vec![0.9, 0.1]);
        assert_eq!(target.weights(1), vec![1.0, 0.0]);
        assert_eq!(target.weights(2), vec![0.1, 0.7]);
        assert_eq!(report.unmatched_vertices, vec![1]);
        assert_eq!(report.unmatched_influences, vec!["tail"]);
    }
}
