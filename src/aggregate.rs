//! Folding iteration outcomes into detection rates.

use crate::error::{BootstrapError, IterationFailure};
use crate::estimate::IterationOutcome;
use crate::result::FailureRecord;

/// Per-edge detection counter.
///
/// Written only by the thread that owns it; parallel outcomes are folded in
/// after the pool has joined.
#[derive(Debug, Clone)]
pub struct DetectionCounts {
    counts: Vec<u64>,
    valid: usize,
    failures: Vec<FailureRecord>,
}

impl DetectionCounts {
    /// Zeroed counter for a tree with `edge_count` edges.
    pub fn new(edge_count: usize) -> Self {
        Self {
            counts: vec![0; edge_count],
            valid: 0,
            failures: Vec::new(),
        }
    }

    /// Record the outcome of iteration `iteration` (1-based).
    ///
    /// A configuration naming an edge outside `1..=edge_count` is recorded
    /// as [`IterationFailure::InvalidEdge`] and contributes no detections.
    pub fn record(&mut self, iteration: usize, outcome: IterationOutcome) {
        match outcome {
            Ok(shifts) => {
                let edge_count = self.counts.len();
                if let Some(&edge) = shifts.iter().find(|&&e| e == 0 || e > edge_count) {
                    self.record_failure(iteration, IterationFailure::InvalidEdge { edge, edge_count });
                    return;
                }
                for edge in shifts {
                    if let Some(slot) = edge.checked_sub(1).and_then(|i| self.counts.get_mut(i)) {
                        *slot += 1;
                    }
                }
                self.valid += 1;
            }
            Err(reason) => self.record_failure(iteration, reason),
        }
    }

    fn record_failure(&mut self, iteration: usize, reason: IterationFailure) {
        self.failures.push(FailureRecord { iteration, reason });
    }

    /// Raw detection counts, index `e - 1` for edge `e`.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Number of successful iterations.
    pub fn valid(&self) -> usize {
        self.valid
    }

    /// Failed iterations in recording order.
    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    /// Total iterations recorded.
    pub fn total(&self) -> usize {
        self.valid + self.failures.len()
    }

    /// Divide counts by the number of valid iterations.
    ///
    /// Fails with [`BootstrapError::NoValidReplicates`] rather than
    /// returning NaN when every iteration failed.
    pub fn rates(&self) -> Result<Vec<f64>, BootstrapError> {
        if self.valid == 0 {
            return Err(BootstrapError::NoValidReplicates {
                iterations: self.total(),
            });
        }
        let denom = self.valid as f64;
        Ok(self.counts.iter().map(|&c| c as f64 / denom).collect())
    }

    /// Split into counts, valid count and failure log.
    pub fn into_parts(self) -> (Vec<u64>, usize, Vec<FailureRecord>) {
        (self.counts, self.valid, self.failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShiftSet;

    #[test]
    fn test_single_detection() {
        let mut counts = DetectionCounts::new(5);
        counts.record(1, Ok(ShiftSet::from([3])));

        assert_eq!(counts.counts(), &[0, 0, 1, 0, 0]);
        assert_eq!(counts.rates().unwrap(), vec![0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_failures_excluded_from_denominator() {
        let mut counts = DetectionCounts::new(3);
        counts.record(1, Ok(ShiftSet::from([1, 2])));
        counts.record(2, Err(IterationFailure::Estimator("nan".into())));
        counts.record(3, Ok(ShiftSet::from([2])));
        counts.record(4, Ok(ShiftSet::new()));

        assert_eq!(counts.valid(), 3);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.failures().len(), 1);
        assert_eq!(counts.failures()[0].iteration, 2);

        let rates = counts.rates().unwrap();
        assert!((rates[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((rates[1] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(rates[2], 0.0);
    }

    #[test]
    fn test_out_of_range_edges_become_failures() {
        let mut counts = DetectionCounts::new(4);
        counts.record(1, Ok(ShiftSet::from([0])));
        counts.record(2, Ok(ShiftSet::from([2, 5])));

        assert_eq!(counts.valid(), 0);
        assert_eq!(counts.counts(), &[0, 0, 0, 0]);
        assert_eq!(
            counts.failures(),
            &[
                FailureRecord {
                    iteration: 1,
                    reason: IterationFailure::InvalidEdge { edge: 0, edge_count: 4 },
                },
                FailureRecord {
                    iteration: 2,
                    reason: IterationFailure::InvalidEdge { edge: 5, edge_count: 4 },
                },
            ]
        );
        assert!(counts.rates().is_err());

        counts.record(3, Ok(ShiftSet::from([4])));
        assert_eq!(counts.rates().unwrap(), vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_all_failed_is_error() {
        let mut counts = DetectionCounts::new(4);
        counts.record(1, Err(IterationFailure::DeadlineExceeded));
        counts.record(2, Err(IterationFailure::Panicked("boom".into())));

        assert!(matches!(
            counts.rates(),
            Err(BootstrapError::NoValidReplicates { iterations: 2 })
        ));
    }

    #[test]
    fn test_count_sum_matches_set_sizes() {
        let sets = [
            ShiftSet::from([1, 4]),
            ShiftSet::from([4]),
            ShiftSet::from([2, 3, 4]),
        ];
        let mut counts = DetectionCounts::new(4);
        for (i, set) in sets.iter().enumerate() {
            counts.record(i + 1, Ok(set.clone()));
        }

        let expected: usize = sets.iter().map(|s| s.len()).sum();
        assert_eq!(counts.counts().iter().sum::<u64>() as usize, expected);
        assert!(counts.rates().unwrap().iter().all(|r| (0.0..=1.0).contains(r)));
    }
}
