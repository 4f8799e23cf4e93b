/*!
# Truncated SVD Projector

Rank-k factorization of the TF-IDF matrix (Latent Semantic Analysis).

Randomized range finder with power iterations (Halko, Martinsson & Tropp),
followed by an exact decomposition of the small projected matrix:

1. `Ω` ~ N(0, 1), shape `(n_terms, k + oversamples)`, drawn from a seeded RNG
2. `Q = orth(X Ω)`, then `n_iter` rounds of `Q = orth(X orth(Xᵀ Q))`
3. `B = Qᵀ X`; eigendecompose `B Bᵀ = W Λ Wᵀ`
4. right singular vectors `vᵢ = Bᵀ wᵢ / σᵢ`, `σᵢ = √λᵢ`

Components are sign-normalized so the largest-magnitude entry of each one is
positive, which makes the whole fit a pure function of `(X, k, seed)`.
*/

use super::linalg::{gaussian_matrix, l2_norm, orthonormalize, symmetric_eigen};
use super::sparse::{CsrMatrix, SparseVector};
use crate::{LsaError, Result};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

/// Singular values below this fraction of the largest are treated as zero
const SINGULAR_TOLERANCE: f64 = 1e-10;

/// Fitted projection parameters
#[derive(Debug, Clone)]
struct Projection {
    /// `(k, n_terms)`; row i is the i-th right singular vector
    components: Array2<f64>,
    singular_values: Vec<f64>,
    explained_variance_ratio: Vec<f64>,
}

/// Truncated SVD over a sparse term-weight matrix
#[derive(Debug, Clone)]
pub struct TruncatedSvd {
    n_components: usize,
    seed: u64,
    n_iter: usize,
    n_oversamples: usize,
    fitted: Option<Projection>,
}

impl TruncatedSvd {
    /// Projector keeping `n_components` dimensions, seeded with `seed`
    pub fn new(n_components: usize, seed: u64) -> Self {
        Self {
            n_components,
            seed,
            n_iter: 5,
            n_oversamples: 10,
            fitted: None,
        }
    }

    /// Number of power iterations of the range finder
    pub fn with_power_iterations(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    /// Extra random vectors sampled beyond `n_components`
    pub fn with_oversamples(mut self, n_oversamples: usize) -> Self {
        self.n_oversamples = n_oversamples;
        self
    }

    /// Fit on `x` and return its projection `X Vᵀ` (shape `(n_docs, k)`)
    ///
    /// `k` larger than the number of columns is clamped with a warning.
    /// When the rank of `x` is below `k` the surplus components are zero.
    pub fn fit(&mut self, x: &CsrMatrix) -> Result<Array2<f64>> {
        if self.fitted.is_some() {
            return Err(LsaError::config("projector is already fitted"));
        }
        if self.n_components == 0 {
            return Err(LsaError::dimension("rank k must be positive", 0, 1));
        }
        if x.n_rows() == 0 {
            return Err(LsaError::dimension("cannot fit on an empty matrix", 0, 1));
        }
        if x.n_cols() == 0 {
            return Err(LsaError::dimension("weight matrix has no columns", 0, 1));
        }

        if self.n_components > x.n_cols() {
            warn!(
                "Requested {} components but vocabulary has only {} terms; clamping",
                self.n_components,
                x.n_cols()
            );
            self.n_components = x.n_cols();
        }
        let k = self.n_components;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let omega = gaussian_matrix(x.n_cols(), k + self.n_oversamples, &mut rng);

        let mut q = orthonormalize(&x.mul_dense(&omega)?);
        for _ in 0..self.n_iter {
            let z = orthonormalize(&x.transpose_mul_dense(&q)?);
            q = orthonormalize(&x.mul_dense(&z)?);
        }

        // Bᵀ = Xᵀ Q, shape (n_terms, r)
        let bt = x.transpose_mul_dense(&q)?;
        let gram = bt.t().dot(&bt);
        let (eigenvalues, eigenvectors) = symmetric_eigen(&gram);
        debug!(
            "Range finder kept {} of {} sampled directions",
            q.ncols(),
            k + self.n_oversamples
        );

        let mut components = Array2::<f64>::zeros((k, x.n_cols()));
        let mut singular_values = vec![0.0; k];
        let mut largest = 0.0;
        for i in 0..k.min(eigenvalues.len()) {
            if eigenvalues[i] <= 0.0 {
                break;
            }
            let u = bt.dot(&eigenvectors.column(i));
            let sigma = l2_norm(u.view());
            if i == 0 {
                largest = sigma;
            }
            if sigma <= SINGULAR_TOLERANCE * largest || sigma == 0.0 {
                break;
            }
            let mut v = u.mapv(|value| value / sigma);
            flip_sign(&mut v);
            components.row_mut(i).assign(&v);
            singular_values[i] = sigma;
        }

        let transformed = x.mul_dense(&components.t().to_owned())?;
        let explained_variance_ratio = explained_variance_ratio(x, &transformed);

        debug!(
            "Truncated SVD fitted: k={}, leading singular value {:.4}",
            k,
            singular_values.first().copied().unwrap_or(0.0)
        );

        self.fitted = Some(Projection {
            components,
            singular_values,
            explained_variance_ratio,
        });
        Ok(transformed)
    }

    /// Project one weight vector with the fitted components
    pub fn transform(&self, weights: &SparseVector) -> Result<Array1<f64>> {
        let projection = self
            .fitted
            .as_ref()
            .ok_or_else(|| LsaError::config("projector must be fitted before transform"))?;

        let n_terms = projection.components.ncols();
        if weights.dim() != n_terms {
            return Err(LsaError::dimension("weight vector", weights.dim(), n_terms));
        }

        let mut out = Array1::<f64>::zeros(projection.components.nrows());
        for (j, value) in weights.iter() {
            out.scaled_add(value, &projection.components.column(j));
        }
        Ok(out)
    }

    /// Output dimension (after clamping, once fitted)
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Singular values in descending order; empty before fit
    pub fn singular_values(&self) -> &[f64] {
        self.fitted
            .as_ref()
            .map(|p| p.singular_values.as_slice())
            .unwrap_or(&[])
    }

    /// Share of the total column variance captured by each component
    pub fn explained_variance_ratio(&self) -> &[f64] {
        self.fitted
            .as_ref()
            .map(|p| p.explained_variance_ratio.as_slice())
            .unwrap_or(&[])
    }

    /// Right singular vectors, one per row; `None` before fit
    pub fn components(&self) -> Option<&Array2<f64>> {
        self.fitted.as_ref().map(|p| &p.components)
    }
}

fn flip_sign(v: &mut Array1<f64>) {
    let mut pivot = 0.0f64;
    for &value in v.iter() {
        if value.abs() > pivot.abs() {
            pivot = value;
        }
    }
    if pivot < 0.0 {
        v.mapv_inplace(|value| -value);
    }
}

fn explained_variance_ratio(x: &CsrMatrix, transformed: &Array2<f64>) -> Vec<f64> {
    let total: f64 = x.column_variances().iter().sum();
    if total <= 0.0 {
        return vec![0.0; transformed.ncols()];
    }

    let n = transformed.nrows() as f64;
    transformed
        .columns()
        .into_iter()
        .map(|column| {
            let mean = column.sum() / n;
            let var = column.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
            var / total
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::topic_corpus;
    use crate::{nlp::Tokenizer, retrieval::TfIdfVectorizer};

    fn matrix(rows: &[&[f64]]) -> CsrMatrix {
        let n_cols = rows[0].len();
        let sparse: Vec<SparseVector> = rows
            .iter()
            .map(|row| {
                let pairs = row
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| **v != 0.0)
                    .map(|(j, v)| (j, *v))
                    .collect();
                SparseVector::from_pairs(n_cols, pairs).unwrap()
            })
            .collect();
        CsrMatrix::from_rows(n_cols, &sparse).unwrap()
    }

    fn topic_matrix() -> CsrMatrix {
        let mut vectorizer = TfIdfVectorizer::new(Tokenizer::english());
        vectorizer.fit(&topic_corpus()).unwrap()
    }

    #[test]
    fn test_diagonal_singular_values() {
        let x = matrix(&[&[3.0, 0.0, 0.0], &[0.0, 2.0, 0.0], &[0.0, 0.0, 1.0]]);
        let mut svd = TruncatedSvd::new(2, 42);
        let out = svd.fit(&x).unwrap();

        assert_eq!(out.dim(), (3, 2));
        let sv = svd.singular_values();
        assert!((sv[0] - 3.0).abs() < 1e-9);
        assert!((sv[1] - 2.0).abs() < 1e-9);

        let components = svd.components().unwrap();
        assert!((components[[0, 0]] - 1.0).abs() < 1e-9);
        assert!((components[[1, 1]] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_components_are_orthonormal() {
        let x = topic_matrix();
        let mut svd = TruncatedSvd::new(4, 42);
        svd.fit(&x).unwrap();

        let c = svd.components().unwrap();
        let gram = c.dot(&c.t());
        for i in 0..4 {
            for j in 0..4 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((gram[[i, j]] - expected).abs() < 1e-8, "gram[{i},{j}]");
            }
        }

        let sv = svd.singular_values();
        assert!(sv.windows(2).all(|w| w[0] >= w[1] - 1e-9));
    }

    #[test]
    fn test_fit_output_equals_transform() {
        let x = topic_matrix();
        let mut svd = TruncatedSvd::new(3, 42);
        let out = svd.fit(&x).unwrap();

        for i in 0..x.n_rows() {
            let (cols, vals) = x.row(i);
            let pairs = cols.iter().copied().zip(vals.iter().copied()).collect();
            let row = SparseVector::from_pairs(x.n_cols(), pairs).unwrap();
            let projected = svd.transform(&row).unwrap();
            for j in 0..3 {
                assert!((projected[j] - out[[i, j]]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_deterministic_with_same_seed() {
        let x = topic_matrix();
        let a = TruncatedSvd::new(3, 7).fit(&x).unwrap();
        let b = TruncatedSvd::new(3, 7).fit(&x).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_clamps_k_to_vocabulary() {
        let x = matrix(&[&[1.0, 0.0], &[0.0, 1.0], &[1.0, 1.0]]);
        let mut svd = TruncatedSvd::new(10, 42);
        let out = svd.fit(&x).unwrap();
        assert_eq!(svd.n_components(), 2);
        assert_eq!(out.ncols(), 2);
    }

    /// In-memory sink for a scoped fmt subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_clamp_emits_warning() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let x = matrix(&[&[1.0, 0.0], &[0.0, 1.0], &[1.0, 1.0]]);
        tracing::subscriber::with_default(subscriber, || {
            TruncatedSvd::new(10, 42).fit(&x).unwrap();
        });

        let output = logs.contents();
        assert!(output.contains("WARN"), "{}", output);
        assert!(
            output.contains("Requested 10 components but vocabulary has only 2 terms"),
            "{}",
            output
        );

        let quiet = CapturedLogs::default();
        let writer = quiet.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            TruncatedSvd::new(2, 42).fit(&x).unwrap();
        });
        assert!(!quiet.contents().contains("WARN"));
    }

    #[test]
    fn test_rank_deficient_pads_with_zero_components() {
        // rank 1: every row is a multiple of [1, 1, 0]
        let x = matrix(&[&[1.0, 1.0, 0.0], &[2.0, 2.0, 0.0]]);
        let mut svd = TruncatedSvd::new(3, 42);
        let out = svd.fit(&x).unwrap();

        assert_eq!(out.dim(), (2, 3));
        let sv = svd.singular_values();
        assert!(sv[0] > 0.0);
        assert_eq!(sv[1], 0.0);
        assert_eq!(sv[2], 0.0);
        assert!(out.column(2).iter().all(|v| *v == 0.0));
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_explained_variance_ratio() {
        let x = topic_matrix();
        let mut svd = TruncatedSvd::new(3, 42);
        svd.fit(&x).unwrap();
        let ratio = svd.explained_variance_ratio();
        assert_eq!(ratio.len(), 3);
        let total: f64 = ratio.iter().sum();
        assert!(total > 0.0 && total <= 1.0 + 1e-9);
    }

    #[test]
    fn test_fit_errors() {
        let x = matrix(&[&[1.0, 0.0]]);
        let err = TruncatedSvd::new(0, 42).fit(&x).unwrap_err();
        assert!(err.is_dimension());

        let empty = CsrMatrix::from_rows(2, &[]).unwrap();
        let err = TruncatedSvd::new(1, 42).fit(&empty).unwrap_err();
        assert!(err.is_dimension());

        let mut svd = TruncatedSvd::new(1, 42);
        svd.fit(&x).unwrap();
        assert!(matches!(svd.fit(&x), Err(LsaError::Configuration(_))));
    }

    #[test]
    fn test_transform_errors() {
        let svd = TruncatedSvd::new(1, 42);
        assert!(matches!(
            svd.transform(&SparseVector::zeros(2)),
            Err(LsaError::Configuration(_))
        ));

        let x = matrix(&[&[1.0, 0.0], &[0.0, 1.0]]);
        let mut svd = TruncatedSvd::new(1, 42);
        svd.fit(&x).unwrap();
        assert!(svd
            .transform(&SparseVector::zeros(3))
            .unwrap_err()
            .is_dimension());
        assert_eq!(svd.transform(&SparseVector::zeros(2)).unwrap()[0], 0.0);
    }
}
