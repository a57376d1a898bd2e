//! Influence naming: namespace stripping and left/right pair resolution.

use serde::{Deserialize, Serialize};

/// Drop namespace qualifiers from every component of a (possibly DAG-pathed) name.
///
/// `rig:L_arm` becomes `L_arm`, `a:grp|a:b:L_hand` becomes `grp|L_hand`.
pub fn strip_namespace(name: &str) -> String {
    name.split('|')
        .map(|part| part.rsplit(':').next().unwrap_or(part))
        .collect::<Vec<_>>()
        .join("|")
}

/// Qualify a bare influence name with `namespace`; empty namespaces leave it alone.
pub fn apply_namespace(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}:{}", namespace, name)
    }
}

/// Find `name` in `influences`, first verbatim and then by namespace-stripped name.
pub fn find_influence(influences: &[String], name: &str) -> Option<usize> {
    if let Some(i) = influences.iter().position(|n| n == name) {
        return Some(i);
    }
    let wanted = strip_namespace(name);
    influences.iter().position(|n| strip_namespace(n) == wanted)
}

/// The tokens marking an influence as belonging to the left or right side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideMarkers {
    pub left: String,
    pub right: String,
}

impl Default for SideMarkers {
    fn default() -> Self {
        Self { left: "L_".into(), right: "R_".into() }
    }
}

/// A left/right column pair whose values swap when mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfluencePair {
    pub left: usize,
    pub right: usize,
}

/// Pair left and right influences whose names agree once their marker token is removed.
///
/// Influences carrying neither token, or whose counterpart is missing, are not paired.
/// A name carrying both tokens counts as left.
pub fn resolve_pairs(influences: &[String], markers: &SideMarkers) -> Vec<InfluencePair> {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for (i, name) in influences.iter().enumerate() {
        let name = strip_namespace(name);
        if !markers.left.is_empty() && name.contains(&markers.left) {
            left.push((i, name.replacen(&markers.left, "", 1)));
        } else if !markers.right.is_empty() && name.contains(&markers.right) {
            right.push((i, name.replacen(&markers.right, "", 1)));
        }
    }

    let mut pairs = Vec::new();
    let mut claimed = vec![false; right.len()];
    for (li, base) in &left {
        let hit = right
            .iter()
            .enumerate()
            .find(|(k, (_, rbase))| !claimed[*k] && rbase == base);
        if let Some((k, (ri, _))) = hit {
            claimed[k] = true;
            log::debug!("paired {} with {}", influences[*li], influences[*ri]);
            pairs.push(InfluencePair { left: *li, right: *ri });
        }
    }
    pairs
}

/// Swap the paired columns of `row` in place.
pub fn swap_pairs(row: &mut [f64], pairs: &[InfluencePair]) {
    for pair in pairs {
        row.swap(pair.left, pair.right);
    }
}
