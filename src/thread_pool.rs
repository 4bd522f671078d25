//! Worker pool construction for parallel bootstrap runs.
//!
//! Each parallel run gets a pool of exactly the requested size, so a run's
//! composition is fixed by its configuration rather than by whatever global
//! pool happens to exist.

use crate::error::BootstrapError;

/// Stack size per worker: 8 MB (vs rayon's default 2 MB).
///
/// Shift estimators commonly recurse over the tree.
#[cfg(feature = "parallel")]
const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Execute `op` inside a freshly built pool of `cores` workers.
///
/// Returns once every task spawned by `op` has joined.
#[cfg(feature = "parallel")]
pub fn install<OP, R>(cores: usize, op: OP) -> Result<R, BootstrapError>
where
    OP: FnOnce() -> R + Send,
    R: Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cores)
        .stack_size(WORKER_STACK_SIZE)
        .thread_name(|i| format!("shift-bootstrap-{i}"))
        .build()
        .map_err(|e| BootstrapError::ThreadPool(e.to_string()))?;
    Ok(pool.install(op))
}

#[cfg(not(feature = "parallel"))]
pub fn install<OP, R>(_cores: usize, op: OP) -> Result<R, BootstrapError>
where
    OP: FnOnce() -> R,
{
    // No parallel feature - just execute directly
    Ok(op())
}
