//! Vertex correspondence across a mirror plane and between two point sets.
//!
//! Both forms partition points by the strict sign of the mirror-axis coordinate and
//! then compare raw positions exactly. Lookups go through a hash on the coordinate
//! bits, so exactness is preserved without the pairwise scan.

use std::collections::HashMap;

use glam::DVec3;

use crate::geometry::Axis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Positive,
    Negative,
    OnPlane,
}

/// Which side of the mirror plane a point lies on; `None` for non-finite coordinates.
pub fn side_of(p: DVec3, axis: Axis) -> Option<Side> {
    let c = axis.component(p);
    if c > 0.0 {
        Some(Side::Positive)
    } else if c < 0.0 {
        Some(Side::Negative)
    } else if c == 0.0 {
        Some(Side::OnPlane)
    } else {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SidePartition {
    pub positive: Vec<usize>,
    pub negative: Vec<usize>,
    pub on_plane: Vec<usize>,
    /// Points with a NaN mirror coordinate; they belong to no side.
    pub invalid: Vec<usize>,
}

pub fn partition(points: &[DVec3], axis: Axis) -> SidePartition {
    let mut out = SidePartition::default();
    for (i, p) in points.iter().enumerate() {
        match side_of(*p, axis) {
            Some(Side::Positive) => out.positive.push(i),
            Some(Side::Negative) => out.negative.push(i),
            Some(Side::OnPlane) => out.on_plane.push(i),
            None => out.invalid.push(i),
        }
    }
    out
}

type ExactKey = [u64; 3];

// -0.0 and 0.0 compare equal, so they must hash equal too.
fn exact_key(p: DVec3) -> ExactKey {
    let bits = |v: f64| if v == 0.0 { 0u64 } else { v.to_bits() };
    [bits(p.x), bits(p.y), bits(p.z)]
}

fn exact_lookup(points: &[DVec3], indices: &[usize]) -> HashMap<ExactKey, usize> {
    let mut map = HashMap::with_capacity(indices.len());
    for &i in indices {
        // first point at a position wins, matching a front-to-back scan
        map.entry(exact_key(points[i])).or_insert(i);
    }
    map
}

/// Correspondence of one mesh with its own reflection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorMap {
    /// `(positive, negative)` vertex pairs.
    pub pairs: Vec<(usize, usize)>,
    pub on_plane: Vec<usize>,
    /// Off-plane vertices with no mirrored counterpart, in index order.
    pub unmatched: Vec<usize>,
}

/// Match each positive-side vertex with the negative-side vertex at its reflection.
pub fn mirror_map(points: &[DVec3], axis: Axis) -> MirrorMap {
    let sides = partition(points, axis);
    let negatives = exact_lookup(points, &sides.negative);

    let mut out = MirrorMap { on_plane: sides.on_plane, ..Default::default() };
    let mut claimed = vec![false; points.len()];
    for &pos in &sides.positive {
        match negatives.get(&exact_key(axis.reflect(points[pos]))) {
            Some(&neg) => {
                claimed[neg] = true;
                out.pairs.push((pos, neg));
            }
            None => out.unmatched.push(pos),
        }
    }
    out.unmatched
        .extend(sides.negative.iter().copied().filter(|&neg| !claimed[neg]));
    out.unmatched.extend(sides.invalid);
    out.unmatched.sort_unstable();
    log::debug!(
        "mirror map on {}: {} pairs, {} on-plane, {} unmatched",
        axis,
        out.pairs.len(),
        out.on_plane.len(),
        out.unmatched.len()
    );
    out
}

/// Correspondence from the vertices of a target point set onto a source point set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correspondence {
    /// `(target, source)` vertex pairs.
    pub pairs: Vec<(usize, usize)>,
    /// Target vertices with no source vertex at the same position.
    pub unmatched: Vec<usize>,
}

/// Two-mesh form: partition both sets by side, then match equal positions within a side.
pub fn correspond(source: &[DVec3], target: &[DVec3], axis: Axis) -> Correspondence {
    let src = partition(source, axis);
    let lookups = [
        (Side::Positive, exact_lookup(source, &src.positive)),
        (Side::Negative, exact_lookup(source, &src.negative)),
        (Side::OnPlane, exact_lookup(source, &src.on_plane)),
    ];

    let mut out = Correspondence::default();
    for (t, p) in target.iter().enumerate() {
        let hit = side_of(*p, axis).and_then(|side| {
            lookups
                .iter()
                .find(|(s, _)| *s == side)
                .and_then(|(_, map)| map.get(&exact_key(*p)))
        });
        match hit {
            Some(&s) => out.pairs.push((t, s)),
            None => out.unmatched.push(t),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(list: &[[f64; 3]]) -> Vec<DVec3> {
        list.iter().map(|p| DVec3::from_array(*p)).collect()
    }

    #[test]
    fn partition_uses_strict_sign() {
        let points = pts(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-0.0, 0.0, 0.0], [-2.0, 0.0, 0.0]]);
        let sides = partition(&points, Axis::X);
        assert_eq!(sides.positive, vec![0]);
        assert_eq!(sides.negative, vec![3]);
        assert_eq!(sides.on_plane, vec![1, 2]);
    }

    #[test]
    fn mirror_map_pairs_exact_reflections() {
        let points = pts(&[[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [-1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        let map = mirror_map(&points, Axis::X);
        assert_eq!(map.pairs, vec![(0, 2)]);
        assert_eq!(map.on_plane, vec![1]);
        assert_eq!(map.unmatched, vec![3]);
    }

    #[test]
    fn mirror_map_is_exact_not_quantized() {
        let points = pts(&[[1.0, 0.5, 0.0], [-1.0000001, 0.5, 0.0]]);
        let map = mirror_map(&points, Axis::X);
        assert!(map.pairs.is_empty());
        assert_eq!(map.unmatched, vec![0, 1]);
    }

    #[test]
    fn mirror_map_on_other_axes() {
        let points = pts(&[[3.0, 2.0, 1.0], [3.0, 2.0, -1.0], [3.0, -2.0, 1.0]]);
        assert_eq!(mirror_map(&points, Axis::Z).pairs, vec![(0, 1)]);
        assert_eq!(mirror_map(&points, Axis::Y).pairs, vec![(0, 2)]);
    }

    #[test]
    fn correspond_handles_reordered_and_resized_sets() {
        let source = pts(&[[0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [-1.0, 1.0, 0.0]]);
        let target = pts(&[[-1.0, 1.0, 0.0], [5.0, 5.0, 5.0], [1.0, 1.0, 0.0], [-0.0, 1.0, 0.0]]);
        let c = correspond(&source, &target, Axis::X);
        assert_eq!(c.pairs, vec![(0, 2), (2, 1), (3, 0)]);
        assert_eq!(c.unmatched, vec![1]);
    }
}
