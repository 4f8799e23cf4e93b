/*!
# Sparse Storage

Compressed sparse row matrices and sorted sparse vectors for term weights.
*/

use crate::{LsaError, Result};
use ndarray::{Array1, Array2};

/// A sparse vector with strictly increasing indices
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// All-zero vector of dimension `dim`
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(index, value)` pairs; pairs are sorted, duplicates rejected
    pub fn from_pairs(dim: usize, mut pairs: Vec<(usize, f64)>) -> Result<Self> {
        pairs.sort_by_key(|&(index, _)| index);

        let mut indices = Vec::with_capacity(pairs.len());
        let mut values = Vec::with_capacity(pairs.len());
        for (index, value) in pairs {
            if index >= dim {
                return Err(LsaError::dimension(
                    "sparse index out of range",
                    index + 1,
                    dim,
                ));
            }
            if indices.last() == Some(&index) {
                return Err(LsaError::other(format!(
                    "duplicate sparse index {}",
                    index
                )));
            }
            indices.push(index);
            values.push(value);
        }

        Ok(Self {
            dim,
            indices,
            values,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Stored `(index, value)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Value at `index` (zero when not stored)
    pub fn get(&self, index: usize) -> f64 {
        self.indices
            .binary_search(&index)
            .map(|pos| self.values[pos])
            .unwrap_or(0.0)
    }

    pub fn l2_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Scale to unit length; zero vectors are left untouched
    pub fn normalize(&mut self) {
        let norm = self.l2_norm();
        if norm > 0.0 {
            for value in &mut self.values {
                *value /= norm;
            }
        }
    }

    pub fn to_dense(&self) -> Array1<f64> {
        let mut dense = Array1::<f64>::zeros(self.dim);
        for (index, value) in self.iter() {
            dense[index] = value;
        }
        dense
    }
}

/// Compressed sparse row matrix
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    n_rows: usize,
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl CsrMatrix {
    /// Stack sparse rows; every row must have dimension `n_cols`
    pub fn from_rows(n_cols: usize, rows: &[SparseVector]) -> Result<Self> {
        let nnz = rows.iter().map(SparseVector::nnz).sum();
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::with_capacity(nnz);
        let mut data = Vec::with_capacity(nnz);

        indptr.push(0);
        for row in rows {
            if row.dim() != n_cols {
                return Err(LsaError::dimension("matrix row", row.dim(), n_cols));
            }
            indices.extend_from_slice(row.indices());
            data.extend_from_slice(row.values());
            indptr.push(indices.len());
        }

        Ok(Self {
            n_rows: rows.len(),
            n_cols,
            indptr,
            indices,
            data,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Column indices and values of row `i`
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let range = self.indptr[i]..self.indptr[i + 1];
        (&self.indices[range.clone()], &self.data[range])
    }

    /// `self · rhs` for a dense `rhs` of shape `(n_cols, l)`
    pub fn mul_dense(&self, rhs: &Array2<f64>) -> Result<Array2<f64>> {
        if rhs.nrows() != self.n_cols {
            return Err(LsaError::dimension(
                "dense operand rows",
                rhs.nrows(),
                self.n_cols,
            ));
        }

        let mut out = Array2::<f64>::zeros((self.n_rows, rhs.ncols()));
        for i in 0..self.n_rows {
            let (cols, vals) = self.row(i);
            let mut out_row = out.row_mut(i);
            for (&j, &value) in cols.iter().zip(vals) {
                out_row.scaled_add(value, &rhs.row(j));
            }
        }
        Ok(out)
    }

    /// `selfᵀ · rhs` for a dense `rhs` of shape `(n_rows, l)`
    pub fn transpose_mul_dense(&self, rhs: &Array2<f64>) -> Result<Array2<f64>> {
        if rhs.nrows() != self.n_rows {
            return Err(LsaError::dimension(
                "dense operand rows",
                rhs.nrows(),
                self.n_rows,
            ));
        }

        let mut out = Array2::<f64>::zeros((self.n_cols, rhs.ncols()));
        for i in 0..self.n_rows {
            let (cols, vals) = self.row(i);
            let rhs_row = rhs.row(i);
            for (&j, &value) in cols.iter().zip(vals) {
                out.row_mut(j).scaled_add(value, &rhs_row);
            }
        }
        Ok(out)
    }

    /// Population variance of every column
    pub fn column_variances(&self) -> Vec<f64> {
        if self.n_rows == 0 {
            return vec![0.0; self.n_cols];
        }

        let mut sums = vec![0.0; self.n_cols];
        let mut squares = vec![0.0; self.n_cols];
        for (&j, &value) in self.indices.iter().zip(&self.data) {
            sums[j] += value;
            squares[j] += value * value;
        }

        let n = self.n_rows as f64;
        sums.iter()
            .zip(&squares)
            .map(|(sum, square)| {
                let mean = sum / n;
                (square / n - mean * mean).max(0.0)
            })
            .collect()
    }
}
