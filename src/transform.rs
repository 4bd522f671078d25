//! Whitening and coloring operators derived from the phylogenetic covariance.
//!
//! Each response dimension gets its own pair of operators, computed once per
//! run from `(tree, alpha[d])`. Dimensions are decorrelated independently;
//! cross-trait covariance is not modelled.

use nalgebra::Cholesky;

use crate::error::{BootstrapError, CollaboratorError};
use crate::types::{Matrix, Vector};

/// Covariance square-root routine.
///
/// Returns `(whiten, color)` for the OU covariance at selection strength
/// `alpha`: `whiten` decorrelates residuals, `color` reintroduces the
/// covariance into independent components.
pub trait CovarianceSqrt<T: ?Sized>: Sync {
    /// Compute the operator pair for one selection strength.
    fn sqrt_pair(&self, tree: &T, alpha: f64) -> Result<(Matrix, Matrix), CollaboratorError>;
}

impl<T: ?Sized, F> CovarianceSqrt<T> for F
where
    F: Fn(&T, f64) -> Result<(Matrix, Matrix), CollaboratorError> + Sync,
{
    fn sqrt_pair(&self, tree: &T, alpha: f64) -> Result<(Matrix, Matrix), CollaboratorError> {
        self(tree, alpha)
    }
}

/// Square root via Cholesky factorisation of a caller-supplied covariance.
///
/// For `Σ = L·Lᵀ` this yields `color = L` and `whiten = L⁻¹`.
pub struct CholeskySqrt<F> {
    covariance: F,
}

impl<F> CholeskySqrt<F> {
    /// Wrap a function producing the model covariance `Σ(alpha)`.
    pub fn new(covariance: F) -> Self {
        Self { covariance }
    }
}

impl<T: ?Sized, F> CovarianceSqrt<T> for CholeskySqrt<F>
where
    F: Fn(&T, f64) -> Matrix + Sync,
{
    fn sqrt_pair(&self, tree: &T, alpha: f64) -> Result<(Matrix, Matrix), CollaboratorError> {
        let sigma = (self.covariance)(tree, alpha);
        if !sigma.is_square() {
            return Err(format!("covariance is {}x{}, not square", sigma.nrows(), sigma.ncols()).into());
        }
        if sigma.iter().any(|x| !x.is_finite()) {
            return Err("covariance has non-finite entries".into());
        }

        let chol = safe_cholesky(sigma).ok_or("covariance is not positive definite")?;
        let color = chol.l();
        let n = color.nrows();
        let whiten = color
            .solve_lower_triangular(&Matrix::identity(n, n))
            .ok_or("cholesky factor is singular")?;

        Ok((whiten, color))
    }
}

/// Cholesky with one retry after adaptive diagonal jitter.
///
/// Jitter: ε = 10⁻¹⁰ + (tr(Σ)/n) × 10⁻⁸
fn safe_cholesky(matrix: Matrix) -> Option<Cholesky<f64, nalgebra::Dyn>> {
    if let Some(chol) = Cholesky::new(matrix.clone()) {
        return Some(chol);
    }

    let n = matrix.nrows().max(1);
    let jitter = 1e-10 + (matrix.trace() / n as f64).abs() * 1e-8;
    log::debug!("cholesky failed, retrying with diagonal jitter {jitter:.3e}");

    let mut regularized = matrix;
    for i in 0..regularized.nrows() {
        regularized[(i, i)] += jitter;
    }
    Cholesky::new(regularized)
}

/// Whitening/coloring pair for one response dimension.
#[derive(Debug, Clone)]
pub struct CovarianceTransform {
    whiten: Matrix,
    color: Matrix,
}

impl CovarianceTransform {
    /// Build from an explicit operator pair.
    pub fn new(whiten: Matrix, color: Matrix) -> Self {
        Self { whiten, color }
    }

    /// Decorrelating operator.
    pub fn whitening(&self) -> &Matrix {
        &self.whiten
    }

    /// Recorrelating operator.
    pub fn coloring(&self) -> &Matrix {
        &self.color
    }

    /// Observation count the operators act on.
    pub fn dim(&self) -> usize {
        self.whiten.nrows()
    }

    /// Apply the whitening operator.
    pub fn whiten(&self, v: &Vector) -> Vector {
        &self.whiten * v
    }

    /// Apply the coloring operator.
    pub fn color(&self, v: &Vector) -> Vector {
        &self.color * v
    }
}

/// Derive one transform per selection strength.
///
/// Fails on the first routine error or wrongly sized operator. Runs before
/// any resampling, so failures here are never retried.
pub fn derive_transforms<T, S>(
    tree: &T,
    alphas: &[f64],
    n_obs: usize,
    sqrt: &S,
) -> Result<Vec<CovarianceTransform>, BootstrapError>
where
    T: ?Sized,
    S: CovarianceSqrt<T> + ?Sized,
{
    alphas
        .iter()
        .enumerate()
        .map(|(dimension, &alpha)| {
            let (whiten, color) = sqrt
                .sqrt_pair(tree, alpha)
                .map_err(|source| BootstrapError::Transform {
                    dimension,
                    alpha,
                    source,
                })?;

            for op in [&whiten, &color] {
                if op.shape() != (n_obs, n_obs) {
                    return Err(BootstrapError::TransformShape {
                        dimension,
                        expected: n_obs,
                        rows: op.nrows(),
                        cols: op.ncols(),
                    });
                }
            }

            log::debug!("derived covariance transform for dimension {dimension} (alpha = {alpha})");
            Ok(CovarianceTransform::new(whiten, color))
        })
        .collect()
}
