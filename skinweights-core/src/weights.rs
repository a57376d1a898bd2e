//! Dense per-vertex weight matrix.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkinError};
use crate::host::SkinHost;

/// Row sums within this distance of 1.0 count as normalized.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// `vertex_count × influence_count` weights, stored row-major.
///
/// Serializes as a list of rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct WeightMatrix {
    vertices: usize,
    influences: usize,
    data: Vec<f64>,
}

impl WeightMatrix {
    pub fn zeros(vertices: usize, influences: usize) -> Self {
        Self { vertices, influences, data: vec![0.0; vertices * influences] }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>, influences: usize) -> Result<Self> {
        let mut data = Vec::with_capacity(rows.len() * influences);
        for (v, row) in rows.iter().enumerate() {
            if row.len() != influences {
                return Err(SkinError::MalformedRecord(format!(
                    "row {} has {} weights, expected {}",
                    v,
                    row.len(),
                    influences
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self { vertices: rows.len(), influences, data })
    }

    /// Materialize the full matrix from a live binding.
    pub fn read(host: &dyn SkinHost) -> Self {
        let influences = host.influences().len();
        let vertices = host.vertex_count();
        let mut data = Vec::with_capacity(vertices * influences);
        for v in 0..vertices {
            data.extend(host.weights(v).into_iter().chain(std::iter::repeat(0.0)).take(influences));
        }
        Self { vertices, influences, data }
    }

    /// Write the given rows back into a live binding.
    pub fn write_rows(&self, host: &mut dyn SkinHost, rows: &[usize]) {
        for &v in rows {
            host.set_weights(v, self.row(v));
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices
    }

    pub fn influence_count(&self) -> usize {
        self.influences
    }

    pub fn row(&self, v: usize) -> &[f64] {
        &self.data[v * self.influences..(v + 1) * self.influences]
    }

    pub fn row_mut(&mut self, v: usize) -> &mut [f64] {
        &mut self.data[v * self.influences..(v + 1) * self.influences]
    }

    pub fn set_row(&mut self, v: usize, row: &[f64]) {
        self.row_mut(v).copy_from_slice(row);
    }

    pub fn get(&self, v: usize, influence: usize) -> f64 {
        self.data[v * self.influences + influence]
    }

    pub fn set(&mut self, v: usize, influence: usize, value: f64) {
        self.data[v * self.influences + influence] = value;
    }

    pub fn column(&self, influence: usize) -> Vec<f64> {
        (0..self.vertices).map(|v| self.get(v, influence)).collect()
    }

    pub fn set_column(&mut self, influence: usize, values: &[f64]) {
        for (v, w) in values.iter().enumerate().take(self.vertices) {
            self.set(v, influence, *w);
        }
    }

    pub fn row_sum(&self, v: usize) -> f64 {
        self.row(v).iter().sum()
    }

    /// Scale row `v` so it sums to 1.0. Rows summing to zero stay untouched.
    pub fn normalize_row(&mut self, v: usize) {
        normalize(self.row_mut(v));
    }

    pub fn is_normalized(&self, epsilon: f64) -> bool {
        (0..self.vertices).all(|v| (self.row_sum(v) - 1.0).abs() <= epsilon)
    }
}

impl TryFrom<Vec<Vec<f64>>> for WeightMatrix {
    type Error = SkinError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        let influences = rows.first().map(Vec::len).unwrap_or(0);
        Self::from_rows(rows, influences)
    }
}

impl From<WeightMatrix> for Vec<Vec<f64>> {
    fn from(m: WeightMatrix) -> Self {
        (0..m.vertices).map(|v| m.row(v).to_vec()).collect()
    }
}

/// Scale `row` in place to sum to 1.0, leaving all-zero rows alone.
pub fn normalize(row: &mut [f64]) {
    let sum: f64 = row.iter().sum();
    if sum > 0.0 {
        for w in row.iter_mut() {
            *w /= sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_and_columns_share_storage() {
        let mut m = WeightMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.25, 0.75]], 2).unwrap();
        assert_eq!(m.column(1), vec![0.0, 0.75]);
        m.set_column(0, &[0.5, 0.5]);
        assert_eq!(m.row(0), &[0.5, 0.0]);
        assert_eq!(m.row(1), &[0.5, 0.75]);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        assert!(WeightMatrix::from_rows(vec![vec![1.0], vec![0.5, 0.5]], 2).is_err());
    }

    #[test]
    fn normalize_row_rescales_to_one() {
        let mut m = WeightMatrix::from_rows(vec![vec![2.0, 2.0], vec![0.0, 0.0]], 2).unwrap();
        m.normalize_row(0);
        m.normalize_row(1);
        assert_eq!(m.row(0), &[0.5, 0.5]);
        assert_eq!(m.row(1), &[0.0, 0.0]);
        assert!(!m.is_normalized(DEFAULT_EPSILON));
    }
}
