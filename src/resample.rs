//! Bootstrap replicate generation.
//!
//! Residuals are whitened once, before the iteration loop. Each replicate
//! resamples whitened residuals with replacement and recolors them with the
//! fitted covariance, so the estimator sees data that carries the model's
//! tree-induced correlation but the empirical residual distribution.

use rand::Rng;

use crate::error::BootstrapError;
use crate::transform::CovarianceTransform;
use crate::types::{Matrix, Response, ResponseKind, Vector};

/// Draw `n` indices uniformly with replacement from `0..n`.
#[inline]
pub fn draw_indices<R: Rng>(n: usize, rng: &mut R) -> Vec<usize> {
    (0..n).map(|_| rng.random_range(0..n)).collect()
}

/// Gather `data` at `indices` into `out`.
///
/// # Panics
///
/// Panics if `out.len() != indices.len()`.
#[inline]
pub fn gather_into(data: &[f64], indices: &[usize], out: &mut [f64]) {
    assert_eq!(
        out.len(),
        indices.len(),
        "Output buffer must have same length as index vector"
    );
    for (slot, &idx) in out.iter_mut().zip(indices) {
        *slot = data[idx];
    }
}

/// Whitened residuals plus everything needed to turn them back into responses.
///
/// Immutable after construction; shared read-only by all iterations.
#[derive(Debug, Clone)]
pub enum ReplicateGenerator {
    /// Single response trait.
    Univariate {
        /// `whiten · (y − mu)`.
        whitened: Vector,
        /// Fitted means.
        mu: Vector,
        /// Operators for the only dimension.
        transform: CovarianceTransform,
    },
    /// Several response traits sharing one resampling index vector.
    Multivariate {
        /// Column `d` is `whiten_d · (y[,d] − mu[,d])`.
        whitened: Matrix,
        /// Fitted means.
        mu: Matrix,
        /// One operator pair per column.
        transforms: Vec<CovarianceTransform>,
    },
}

impl ReplicateGenerator {
    /// Whiten univariate residuals.
    pub fn univariate(y: &Vector, mu: &Vector, transform: CovarianceTransform) -> Self {
        let whitened = transform.whiten(&(y - mu));
        Self::Univariate {
            whitened,
            mu: mu.clone(),
            transform,
        }
    }

    /// Whiten each column with its own operator.
    ///
    /// Fails with [`BootstrapError::AlphaMismatch`] when the number of
    /// transforms differs from the number of columns.
    pub fn multivariate(
        y: &Matrix,
        mu: &Matrix,
        transforms: Vec<CovarianceTransform>,
    ) -> Result<Self, BootstrapError> {
        if transforms.len() != y.ncols() {
            return Err(BootstrapError::AlphaMismatch {
                expected: y.ncols(),
                got: transforms.len(),
            });
        }

        let mut whitened = Matrix::zeros(y.nrows(), y.ncols());
        for (d, transform) in transforms.iter().enumerate() {
            let residual: Vector = y.column(d) - mu.column(d);
            whitened.set_column(d, &transform.whiten(&residual));
        }

        Ok(Self::Multivariate {
            whitened,
            mu: mu.clone(),
            transforms,
        })
    }

    /// Which path this generator serves.
    pub fn kind(&self) -> ResponseKind {
        match self {
            Self::Univariate { .. } => ResponseKind::Univariate,
            Self::Multivariate { .. } => ResponseKind::Multivariate,
        }
    }

    /// Number of observations per replicate.
    pub fn n_obs(&self) -> usize {
        match self {
            Self::Univariate { whitened, .. } => whitened.len(),
            Self::Multivariate { whitened, .. } => whitened.nrows(),
        }
    }

    /// Produce one bootstrap replicate.
    ///
    /// Both variants draw exactly one index vector of length N, so with a
    /// single column they consume the random stream identically.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Response {
        let n = self.n_obs();
        let indices = draw_indices(n, rng);

        match self {
            Self::Univariate {
                whitened,
                mu,
                transform,
            } => {
                let mut resampled = Vector::zeros(n);
                gather_into(whitened.as_slice(), &indices, resampled.as_mut_slice());
                Response::Univariate(transform.color(&resampled) + mu)
            }
            Self::Multivariate {
                whitened,
                mu,
                transforms,
            } => {
                let mut out = Matrix::zeros(n, whitened.ncols());
                let mut resampled = Vector::zeros(n);
                for (d, transform) in transforms.iter().enumerate() {
                    for (slot, &idx) in resampled.iter_mut().zip(&indices) {
                        *slot = whitened[(idx, d)];
                    }
                    let colored = transform.color(&resampled) + mu.column(d);
                    out.set_column(d, &colored);
                }
                Response::Multivariate(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn identity_transform(n: usize) -> CovarianceTransform {
        CovarianceTransform::new(Matrix::identity(n, n), Matrix::identity(n, n))
    }

    #[test]
    fn test_draw_indices_in_range() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let idx = draw_indices(50, &mut rng);
        assert_eq!(idx.len(), 50);
        assert!(idx.iter().all(|&i| i < 50));
    }

    #[test]
    fn test_draw_indices_empty() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        assert!(draw_indices(0, &mut rng).is_empty());
    }

    #[test]
    fn test_univariate_replicate_samples_residuals() {
        // Identity operators: replicate = mu + resampled raw residuals.
        let y = Vector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let mu = Vector::from_element(5, 1.0);
        let residuals = &y - &mu;
        let gen = ReplicateGenerator::univariate(&y, &mu, identity_transform(5));
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);

        let Response::Univariate(replicate) = gen.generate(&mut rng) else {
            panic!("expected univariate replicate");
        };
        assert_eq!(replicate.len(), 5);
        for value in replicate.iter() {
            let residual = value - 1.0;
            assert!(residuals.iter().any(|r| (r - residual).abs() < 1e-12));
        }
    }

    #[test]
    fn test_univariate_replicate_recolors() {
        // Diagonal scaling: whiten divides by 2, color multiplies by 2.
        let whiten = Matrix::identity(3, 3) * 0.5;
        let color = Matrix::identity(3, 3) * 2.0;
        let y = Vector::from_vec(vec![4.0, 4.0, 4.0]);
        let mu = Vector::from_vec(vec![1.0, 2.0, 3.0]);
        let gen = ReplicateGenerator::univariate(&y, &mu, CovarianceTransform::new(whiten, color));

        let Response::Univariate(replicate) = gen.generate(&mut Xoshiro256PlusPlus::seed_from_u64(1))
        else {
            panic!("expected univariate replicate");
        };
        // Residuals are 3, 2, 1; every value is mu_i + one of them.
        for (i, value) in replicate.iter().enumerate() {
            let residual = value - mu[i];
            assert!([3.0, 2.0, 1.0].iter().any(|r| (r - residual).abs() < 1e-12));
        }
    }

    #[test]
    fn test_multivariate_shares_indices_across_columns() {
        // Column 1 is column 0 shifted by 10, so rows must stay paired.
        let y = Matrix::from_fn(6, 2, |i, j| i as f64 + 10.0 * j as f64);
        let mu = Matrix::zeros(6, 2);
        let gen = ReplicateGenerator::multivariate(
            &y,
            &mu,
            vec![identity_transform(6), identity_transform(6)],
        )
        .unwrap();

        let Response::Multivariate(replicate) = gen.generate(&mut Xoshiro256PlusPlus::seed_from_u64(3))
        else {
            panic!("expected multivariate replicate");
        };
        assert_eq!(replicate.shape(), (6, 2));
        for i in 0..6 {
            assert_relative_eq!(replicate[(i, 1)] - replicate[(i, 0)], 10.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_multivariate_gathers_each_column_at_drawn_rows() {
        let y = Matrix::from_fn(5, 3, |i, j| (i * 7 + j * 100) as f64);
        let mu = Matrix::from_element(5, 3, 0.5);
        let gen = ReplicateGenerator::multivariate(
            &y,
            &mu,
            vec![identity_transform(5), identity_transform(5), identity_transform(5)],
        )
        .unwrap();

        let indices = draw_indices(5, &mut Xoshiro256PlusPlus::seed_from_u64(17));
        let Response::Multivariate(replicate) = gen.generate(&mut Xoshiro256PlusPlus::seed_from_u64(17))
        else {
            panic!("expected multivariate replicate");
        };
        for (k, &idx) in indices.iter().enumerate() {
            for d in 0..3 {
                assert_relative_eq!(replicate[(k, d)], y[(idx, d)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_multivariate_rejects_transform_count() {
        let y = Matrix::zeros(4, 3);
        let err = ReplicateGenerator::multivariate(
            &y,
            &y,
            vec![identity_transform(4), identity_transform(4)],
        )
        .unwrap_err();
        assert!(matches!(err, BootstrapError::AlphaMismatch { expected: 3, got: 2 }));
    }

    #[test]
    fn test_single_column_paths_agree() {
        let color = Matrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 0.5, 1.0, 0.0, 0.25, 0.5, 1.0]);
        let whiten = color.clone().try_inverse().unwrap();
        let transform = CovarianceTransform::new(whiten, color);

        let y = Vector::from_vec(vec![0.3, -1.2, 2.5]);
        let mu = Vector::from_vec(vec![0.1, 0.1, 0.4]);
        let uni = ReplicateGenerator::univariate(&y, &mu, transform.clone());
        let multi = ReplicateGenerator::multivariate(
            &Matrix::from_column_slice(3, 1, y.as_slice()),
            &Matrix::from_column_slice(3, 1, mu.as_slice()),
            vec![transform],
        )
        .unwrap();

        let a = uni.generate(&mut Xoshiro256PlusPlus::seed_from_u64(101));
        let b = multi.generate(&mut Xoshiro256PlusPlus::seed_from_u64(101));
        assert_relative_eq!(a.to_matrix(), b.to_matrix(), epsilon = 1e-12);
    }
}
