//! Type aliases and common types.

use std::collections::BTreeSet;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Dense matrix used for responses, fitted means and covariance operators.
pub type Matrix = DMatrix<f64>;

/// Dense column vector.
pub type Vector = DVector<f64>;

/// Set of detected shift positions, as 1-based edge indices.
///
/// Ordered and de-duplicated, so an edge reported twice in one
/// configuration is counted once.
pub type ShiftSet = BTreeSet<usize>;

/// Response data handed to the shift estimator.
///
/// Resolved once from the number of response columns: a single column is
/// carried as a vector, two or more as a matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// One response trait, one value per tip.
    Univariate(Vector),
    /// Several response traits, one column per trait.
    Multivariate(Matrix),
}

impl Response {
    /// Number of observations (tips).
    pub fn nrows(&self) -> usize {
        match self {
            Self::Univariate(v) => v.len(),
            Self::Multivariate(m) => m.nrows(),
        }
    }

    /// Number of response dimensions.
    pub fn ncols(&self) -> usize {
        match self {
            Self::Univariate(_) => 1,
            Self::Multivariate(m) => m.ncols(),
        }
    }

    /// View as an N×M matrix regardless of variant.
    pub fn to_matrix(&self) -> Matrix {
        match self {
            Self::Univariate(v) => Matrix::from_column_slice(v.len(), 1, v.as_slice()),
            Self::Multivariate(m) => m.clone(),
        }
    }
}

/// Which resampling path a run took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseKind {
    /// Single-column response.
    Univariate,
    /// Multi-column response with shared resampling indices.
    Multivariate,
}

/// Read-only view of the phylogeny.
///
/// The bootstrap only needs the edge count; everything else the estimator
/// needs stays behind the implementing type.
pub trait PhyloTree: Sync {
    /// Number of edges `E`. Shift positions are indexed `1..=E`.
    fn edge_count(&self) -> usize;
}

/// A fitted OU shift model.
#[derive(Debug, Clone)]
pub struct ShiftModel<O> {
    /// Observed responses, N observations × M dimensions.
    pub y: Matrix,
    /// Fitted means, same shape as `y`.
    pub mu: Matrix,
    /// Selection strength per response dimension.
    pub alpha: Vec<f64>,
    /// Estimator options, passed through untouched.
    pub options: O,
}

impl<O> ShiftModel<O> {
    /// Model with a single response trait.
    pub fn univariate(y: Vector, mu: Vector, alpha: f64, options: O) -> Self {
        Self {
            y: Matrix::from_column_slice(y.len(), 1, y.as_slice()),
            mu: Matrix::from_column_slice(mu.len(), 1, mu.as_slice()),
            alpha: vec![alpha],
            options,
        }
    }

    /// Model with one column per response trait.
    pub fn multivariate(y: Matrix, mu: Matrix, alpha: Vec<f64>, options: O) -> Self {
        Self {
            y,
            mu,
            alpha,
            options,
        }
    }

    /// Number of observations.
    pub fn n_obs(&self) -> usize {
        self.y.nrows()
    }

    /// Number of response dimensions.
    pub fn n_dims(&self) -> usize {
        self.y.ncols()
    }
}
