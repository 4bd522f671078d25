//! Re-estimation of shift configurations on bootstrap replicates.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{CollaboratorError, IterationFailure};
use crate::types::{PhyloTree, Response, ShiftSet};

/// Outcome of one bootstrap iteration.
pub type IterationOutcome = Result<ShiftSet, IterationFailure>;

/// Shift-configuration estimator.
///
/// Returns the set of 1-based edge indices where shifts were placed. May
/// fail on replicates where the inner optimizer does not converge.
///
/// # Panics
///
/// A panic inside `estimate` is caught and recorded as
/// [`IterationFailure::Panicked`]. The process panic hook still runs first,
/// so the default hook prints one message to stderr per panicking replicate.
/// Install a quieter hook with [`std::panic::set_hook`] around the run if
/// that output is unwanted.
pub trait ShiftEstimator<T: ?Sized, O>: Sync {
    /// Estimate a shift configuration for `response` on `tree`.
    fn estimate(&self, tree: &T, response: &Response, options: &O) -> Result<ShiftSet, CollaboratorError>;
}

impl<T: ?Sized, O, F> ShiftEstimator<T, O> for F
where
    F: Fn(&T, &Response, &O) -> Result<ShiftSet, CollaboratorError> + Sync,
{
    fn estimate(&self, tree: &T, response: &Response, options: &O) -> Result<ShiftSet, CollaboratorError> {
        self(tree, response, options)
    }
}

/// Run the estimator on one replicate without letting it abort the run.
///
/// Estimator errors and panics become [`IterationFailure`]s; so do edges
/// outside `1..=edge_count`. An empty configuration is passed through.
/// Caught panics still reach the panic hook; see [`ShiftEstimator`].
pub fn reestimate<T, O, E>(
    tree: &T,
    response: &Response,
    options: &O,
    estimator: &E,
    iteration: usize,
) -> IterationOutcome
where
    T: PhyloTree + ?Sized,
    E: ShiftEstimator<T, O> + ?Sized,
{
    let result = panic::catch_unwind(AssertUnwindSafe(|| estimator.estimate(tree, response, options)));

    let outcome = match result {
        Ok(Ok(shifts)) => validate_edges(shifts, tree.edge_count()),
        Ok(Err(err)) => Err(IterationFailure::Estimator(err.to_string())),
        Err(payload) => Err(IterationFailure::Panicked(panic_message(payload.as_ref()))),
    };

    if let Err(reason) = &outcome {
        log::warn!("bootstrap iteration {iteration}: {reason}");
    }
    outcome
}

fn validate_edges(shifts: ShiftSet, edge_count: usize) -> IterationOutcome {
    match shifts.iter().find(|&&edge| edge == 0 || edge > edge_count) {
        Some(&edge) => Err(IterationFailure::InvalidEdge { edge, edge_count }),
        None => Ok(shifts),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
