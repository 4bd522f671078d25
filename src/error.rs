//! Error types.
//!
//! Two layers: [`BootstrapError`] aborts a run before or after the iteration
//! loop, [`IterationFailure`] is absorbed per iteration and only shows up in
//! the final denominator and the failure log.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised by an external collaborator (estimator or square-root routine).
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Hard errors that abort a bootstrap run.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Run configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Response matrix has no columns or no rows.
    #[error("response matrix is empty ({rows}x{cols})")]
    EmptyResponse {
        /// Rows in `y`.
        rows: usize,
        /// Columns in `y`.
        cols: usize,
    },

    /// Fitted means do not match the response shape.
    #[error("fitted mean is {mu_rows}x{mu_cols} but response is {rows}x{cols}")]
    ShapeMismatch {
        /// Rows in `y`.
        rows: usize,
        /// Columns in `y`.
        cols: usize,
        /// Rows in `mu`.
        mu_rows: usize,
        /// Columns in `mu`.
        mu_cols: usize,
    },

    /// Number of selection strengths differs from the response dimension.
    #[error("expected {expected} alpha value(s) for {expected} response column(s), got {got}")]
    AlphaMismatch {
        /// Number of response columns.
        expected: usize,
        /// Length of `alpha`.
        got: usize,
    },

    /// Covariance square-root routine failed.
    #[error("covariance transform failed for dimension {dimension} (alpha = {alpha}): {source}")]
    Transform {
        /// Zero-based response dimension.
        dimension: usize,
        /// Selection strength the routine was called with.
        alpha: f64,
        /// Underlying failure.
        #[source]
        source: CollaboratorError,
    },

    /// Square-root routine returned operators of the wrong size.
    #[error("covariance transform for dimension {dimension} is {rows}x{cols}, expected {expected}x{expected}")]
    TransformShape {
        /// Zero-based response dimension.
        dimension: usize,
        /// Observation count the operators must match.
        expected: usize,
        /// Rows of the offending operator.
        rows: usize,
        /// Columns of the offending operator.
        cols: usize,
    },

    /// Worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    /// Every iteration failed, so no detection rate can be computed.
    #[error("no valid bootstrap replicate in {iterations} iteration(s)")]
    NoValidReplicates {
        /// Iterations attempted.
        iterations: usize,
    },
}

/// Reason a single bootstrap iteration produced no shift configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum IterationFailure {
    /// Estimator returned an error (typically non-convergence).
    #[error("estimator failed: {0}")]
    Estimator(String),

    /// Estimator panicked.
    #[error("estimator panicked: {0}")]
    Panicked(String),

    /// Estimator reported an edge outside `1..=edge_count`.
    #[error("estimator reported edge {edge}, tree has {edge_count} edges")]
    InvalidEdge {
        /// Offending edge index.
        edge: usize,
        /// Number of edges in the tree.
        edge_count: usize,
    },

    /// Iteration was not started because the run deadline had passed.
    #[error("iteration skipped: run deadline exceeded")]
    DeadlineExceeded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_mismatch_message() {
        let err = BootstrapError::AlphaMismatch { expected: 3, got: 2 };
        assert_eq!(
            err.to_string(),
            "expected 3 alpha value(s) for 3 response column(s), got 2"
        );
    }

    #[test]
    fn test_transform_error_keeps_source() {
        use std::error::Error as _;

        let err = BootstrapError::Transform {
            dimension: 1,
            alpha: 0.5,
            source: "not positive definite".into(),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("dimension 1"));
    }
}
