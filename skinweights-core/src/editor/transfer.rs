//! Move a share of one influence's weight onto another ("weight jumping").

use crate::error::{OperationReport, Result, SkinError};
use crate::host::{FlagScope, SkinHost};
use crate::influence::find_influence;

/// Move `percent` of `source`'s weight onto `target` for every vertex in `vertices`
/// (all vertices when `None`).
///
/// Per vertex: `target += source * p`, `source *= 1 - p` with `p = percent / 100`.
/// Other columns are untouched, so row sums are preserved. Normalize-on-write is off
/// while the two columns are written.
pub fn transfer(
    host: &mut dyn SkinHost,
    source: &str,
    target: &str,
    percent: f64,
    vertices: Option<&[usize]>,
) -> Result<OperationReport> {
    if !(0.0..=100.0).contains(&percent) {
        return Err(SkinError::PercentOutOfRange(percent));
    }
    let src = find_influence(host.influences(), source)
        .ok_or_else(|| SkinError::UnknownInfluence(source.to_string()))?;
    let dst = find_influence(host.influences(), target)
        .ok_or_else(|| SkinError::UnknownInfluence(target.to_string()))?;
    if src == dst {
        return Err(SkinError::SameInfluence(source.to_string()));
    }

    let count = host.vertex_count();
    let scope_vertices: Vec<usize> = match vertices {
        Some(list) => {
            if let Some(&index) = list.iter().find(|&&v| v >= count) {
                return Err(SkinError::VertexOutOfRange { index, count });
            }
            list.to_vec()
        }
        None => (0..count).collect(),
    };

    let share = percent / 100.0;
    let src_weights = host.influence_weights(src, &scope_vertices);
    let dst_weights = host.influence_weights(dst, &scope_vertices);
    let new_dst: Vec<f64> =
        src_weights.iter().zip(&dst_weights).map(|(s, t)| t + s * share).collect();
    let new_src: Vec<f64> = src_weights.iter().map(|s| s * (1.0 - share)).collect();

    let mut scope = FlagScope::without_normalize(host);
    scope.set_influence_weights(dst, &scope_vertices, &new_dst);
    scope.set_influence_weights(src, &scope_vertices, &new_src);
    log::info!(
        "moved {}% of {} onto {} across {} vertices",
        percent,
        source,
        target,
        scope_vertices.len()
    );

    Ok(OperationReport { written: scope_vertices.len(), ..Default::default() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryBinding;
    use glam::DVec3;

    fn binding() -> MemoryBinding {
        let points = vec![DVec3::ZERO; 3];
        MemoryBinding::new("skin", points, vec!["ik_arm".into(), "bind_arm".into(), "spine".into()])
            .with_weights(vec![vec![0.6, 0.2, 0.2], vec![1.0, 0.0, 0.0], vec![0.0, 0.5, 0.5]])
            .unwrap()
    }

    #[test]
    fn full_transfer_moves_everything() {
        let mut b = binding();
        transfer(&mut b, "ik_arm", "bind_arm", 100.0, None).unwrap();
        assert_eq!(b.weights(0), vec![0.0, 0.8, 0.2]);
        assert_eq!(b.weights(1), vec![0.0, 1.0, 0.0]);
        assert_eq!(b.weights(2), vec![0.0, 0.5, 0.5]);
        assert!(b.normalize_weights());
    }

    #[test]
    fn subset_transfer_leaves_other_vertices() {
        let mut b = binding();
        transfer(&mut b, "ik_arm", "bind_arm", 50.0, Some(&[1])).unwrap();
        assert_eq!(b.weights(0), vec![0.6, 0.2, 0.2]);
        assert_eq!(b.weights(1), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn zero_percent_is_a_no_op() {
        let mut b = binding();
        let before = b.clone();
        transfer(&mut b, "ik_arm", "spine", 0.0, None).unwrap();
        assert_eq!(b, before);
    }

    #[test]
    fn rejects_bad_arguments_without_writing() {
        let mut b = binding();
        let before = b.clone();
        assert!(matches!(
            transfer(&mut b, "ik_arm", "bind_arm", 120.0, None),
            Err(SkinError::PercentOutOfRange(_))
        ));
        assert!(matches!(
            transfer(&mut b, "ik_arm", "nope", 10.0, None),
            Err(SkinError::UnknownInfluence(_))
        ));
        assert!(matches!(
            transfer(&mut b, "spine", "spine", 10.0, None),
            Err(SkinError::SameInfluence(_))
        ));
        assert!(matches!(
            transfer(&mut b, "ik_arm", "spine", 10.0, Some(&[0, 7])),
            Err(SkinError::VertexOutOfRange { index: 7, count: 3 })
        ));
        assert_eq!(b, before);
    }
}
