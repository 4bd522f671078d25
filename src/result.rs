//! Bootstrap result types.

use serde::{Deserialize, Serialize};

use crate::error::IterationFailure;
use crate::types::ResponseKind;

/// Complete result from a bootstrap support run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportResult {
    /// Detection rate per edge (0.0 to 1.0); index `e - 1` for edge `e`.
    pub rates: Vec<f64>,

    /// Raw detection counts per edge, same indexing as `rates`.
    pub counts: Vec<u64>,

    /// Iterations requested.
    pub iterations: usize,

    /// Iterations that produced a shift configuration (the rate denominator).
    pub valid_iterations: usize,

    /// Iterations that failed, with their reasons.
    pub failures: Vec<FailureRecord>,

    /// Metadata for debugging.
    pub metadata: Metadata,
}

/// One failed iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// 1-based iteration index.
    pub iteration: usize,
    /// Why no configuration was produced.
    pub reason: IterationFailure,
}

/// How the iterations were scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// One random stream advanced across all iterations.
    Sequential,
    /// Worker pool with one seeded generator per iteration.
    Parallel {
        /// Worker pool size.
        cores: usize,
        /// Iteration `i` used seed `base_seed + i`.
        base_seed: u64,
    },
}

/// Run metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Univariate or multivariate resampling.
    pub response: ResponseKind,
    /// Observations per replicate.
    pub n_obs: usize,
    /// Response dimensions per replicate.
    pub n_dims: usize,
    /// Scheduling mode.
    pub mode: ExecutionMode,
    /// Wall-clock time for the whole run.
    pub runtime_secs: f64,
}

impl SupportResult {
    /// Number of edges in the tree.
    pub fn edge_count(&self) -> usize {
        self.rates.len()
    }

    /// Detection rate of edge `edge` (1-based).
    pub fn rate(&self, edge: usize) -> Option<f64> {
        edge.checked_sub(1).and_then(|i| self.rates.get(i).copied())
    }

    /// Detection count of edge `edge` (1-based).
    pub fn count(&self, edge: usize) -> Option<u64> {
        edge.checked_sub(1).and_then(|i| self.counts.get(i).copied())
    }

    /// Number of failed iterations.
    pub fn failed_iterations(&self) -> usize {
        self.failures.len()
    }

    /// Edges whose detection rate is at least `threshold`, 1-based.
    ///
    /// A threshold of `0.0` returns every edge.
    pub fn supported_edges(&self, threshold: f64) -> Vec<usize> {
        self.rates
            .iter()
            .enumerate()
            .filter(|&(_, &rate)| rate >= threshold)
            .map(|(i, _)| i + 1)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result() -> SupportResult {
        SupportResult {
            rates: vec![0.0, 0.25, 1.0, 0.5],
            counts: vec![0, 1, 4, 2],
            iterations: 5,
            valid_iterations: 4,
            failures: vec![FailureRecord {
                iteration: 2,
                reason: IterationFailure::Estimator("did not converge".into()),
            }],
            metadata: Metadata {
                response: ResponseKind::Univariate,
                n_obs: 8,
                n_dims: 1,
                mode: ExecutionMode::Sequential,
                runtime_secs: 0.01,
            },
        }
    }

    #[test]
    fn test_edge_accessors_are_one_based() {
        let result = make_result();
        assert_eq!(result.edge_count(), 4);
        assert_eq!(result.rate(3), Some(1.0));
        assert_eq!(result.count(2), Some(1));
        assert_eq!(result.rate(0), None);
        assert_eq!(result.rate(5), None);
    }

    #[test]
    fn test_supported_edges() {
        let result = make_result();
        assert_eq!(result.supported_edges(0.5), vec![3, 4]);
        assert_eq!(result.supported_edges(0.25), vec![2, 3, 4]);
        assert_eq!(result.supported_edges(0.0), vec![1, 2, 3, 4]);
        assert!(result.supported_edges(1.5).is_empty());
        assert_eq!(result.failed_iterations(), 1);
    }
}
