//! Dense linear algebra kernels used by the projector

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::Rng;

/// Columns whose residual norm falls below this fraction of their original
/// norm are treated as linearly dependent and dropped.
const RANK_TOLERANCE: f64 = 1e-10;

const MAX_JACOBI_SWEEPS: usize = 100;

/// Off-diagonal mass, relative to the Frobenius norm, at which Jacobi stops
const JACOBI_TOLERANCE: f64 = 1e-13;

pub fn l2_norm(v: ArrayView1<f64>) -> f64 {
    v.dot(&v).sqrt()
}

/// Matrix of independent standard normal samples (Box-Muller)
pub fn gaussian_matrix(rows: usize, cols: usize, rng: &mut StdRng) -> Array2<f64> {
    let mut samples = Vec::with_capacity(rows * cols);
    while samples.len() < rows * cols {
        // gen::<f64>() is in [0, 1); shift to (0, 1] so ln() stays finite
        let u1 = 1.0 - rng.gen::<f64>();
        let u2 = rng.gen::<f64>();
        let radius = (-2.0 * u1.ln()).sqrt();
        let angle = 2.0 * std::f64::consts::PI * u2;
        samples.push(radius * angle.cos());
        samples.push(radius * angle.sin());
    }
    samples.truncate(rows * cols);
    Array2::from_shape_vec((rows, cols), samples)
        .unwrap_or_else(|_| Array2::zeros((rows, cols)))
}

/// Orthonormal basis for the column space of `a`
///
/// Modified Gram-Schmidt with one re-orthogonalization pass. Dependent
/// columns are dropped, so the result may have fewer columns than `a`.
pub fn orthonormalize(a: &Array2<f64>) -> Array2<f64> {
    let mut basis: Vec<Array1<f64>> = Vec::with_capacity(a.ncols());

    for column in a.columns() {
        let original = l2_norm(column);
        if original == 0.0 {
            continue;
        }

        let mut v = column.to_owned();
        for _ in 0..2 {
            for q in &basis {
                let projection = q.dot(&v);
                v.scaled_add(-projection, q);
            }
        }

        let norm = l2_norm(v.view());
        if norm <= RANK_TOLERANCE * original {
            continue;
        }
        v.mapv_inplace(|x| x / norm);
        basis.push(v);
    }

    let mut q = Array2::<f64>::zeros((a.nrows(), basis.len()));
    for (mut column, v) in q.columns_mut().into_iter().zip(&basis) {
        column.assign(v);
    }
    q
}

/// Eigendecomposition of a symmetric matrix by cyclic Jacobi rotations
///
/// Returns eigenvalues in descending order and the matching eigenvectors as
/// columns. Ties keep their diagonal order.
pub fn symmetric_eigen(a: &Array2<f64>) -> (Vec<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut m = a.clone();
    let mut v = Array2::<f64>::eye(n);

    let scale = m.iter().map(|x| x * x).sum::<f64>().sqrt();
    if scale > 0.0 {
        for _ in 0..MAX_JACOBI_SWEEPS {
            let mut off = 0.0;
            for p in 0..n {
                for q in (p + 1)..n {
                    off += m[[p, q]] * m[[p, q]];
                }
            }
            if off.sqrt() <= JACOBI_TOLERANCE * scale {
                break;
            }

            for p in 0..n {
                for q in (p + 1)..n {
                    let apq = m[[p, q]];
                    if apq == 0.0 {
                        continue;
                    }
                    let theta = (m[[q, q]] - m[[p, p]]) / (2.0 * apq);
                    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                    let c = 1.0 / (t * t + 1.0).sqrt();
                    let s = t * c;

                    for k in 0..n {
                        let mkp = m[[k, p]];
                        let mkq = m[[k, q]];
                        m[[k, p]] = c * mkp - s * mkq;
                        m[[k, q]] = s * mkp + c * mkq;
                    }
                    for k in 0..n {
                        let mpk = m[[p, k]];
                        let mqk = m[[q, k]];
                        m[[p, k]] = c * mpk - s * mqk;
                        m[[q, k]] = s * mpk + c * mqk;
                    }
                    for k in 0..n {
                        let vkp = v[[k, p]];
                        let vkq = v[[k, q]];
                        v[[k, p]] = c * vkp - s * vkq;
                        v[[k, q]] = s * vkp + c * vkq;
                    }
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| m[[j, j]].total_cmp(&m[[i, i]]).then(i.cmp(&j)));

    let values = order.iter().map(|&i| m[[i, i]]).collect();
    let mut vectors = Array2::<f64>::zeros((n, n));
    for (dst, &src) in order.iter().enumerate() {
        vectors.column_mut(dst).assign(&v.column(src));
    }
    (values, vectors)
}

/// Scale every row to unit length
///
/// Rows whose norm is at or below `floor` are rounding residue and are set
/// to exactly zero instead.
pub fn normalize_rows(m: &mut Array2<f64>, floor: f64) {
    for mut row in m.rows_mut() {
        let norm = l2_norm(row.view());
        if norm > floor {
            row.mapv_inplace(|x| x / norm);
        } else {
            row.fill(0.0);
        }
    }
}
