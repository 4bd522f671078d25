//! Scheduling of bootstrap iterations.
//!
//! Sequential runs advance one random stream across all iterations and fold
//! outcomes as they arrive. Parallel runs give every iteration its own
//! generator seeded with `base_seed + i`, collect all outcomes in iteration
//! order once the pool has joined, and only then fold them. Nothing is
//! shared mutably while iterations run.

use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::aggregate::DetectionCounts;
use crate::config::Config;
use crate::error::{BootstrapError, IterationFailure};
use crate::estimate::{reestimate, IterationOutcome, ShiftEstimator};
use crate::resample::ReplicateGenerator;
use crate::result::ExecutionMode;
use crate::types::PhyloTree;

/// Seed for iteration `iteration` (1-based) in parallel mode.
#[inline]
pub fn iteration_seed(base_seed: u64, iteration: usize) -> u64 {
    base_seed.wrapping_add(iteration as u64)
}

/// How iterations are run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// One stream; `None` seeds from the thread-local generator.
    Sequential {
        /// Stream seed.
        seed: Option<u64>,
    },
    /// Pool of `cores` workers, iteration `i` seeded with `base_seed + i`.
    Parallel {
        /// Worker pool size.
        cores: usize,
        /// Seed offset.
        base_seed: u64,
    },
}

impl Schedule {
    /// Pick the schedule a configuration asks for.
    pub fn from_config(config: &Config) -> Self {
        if config.multicore {
            Self::Parallel {
                cores: config.cores,
                base_seed: config.base_seed,
            }
        } else {
            Self::Sequential { seed: config.seed }
        }
    }

    /// Mode recorded in the result metadata.
    pub fn mode(&self) -> ExecutionMode {
        match *self {
            Self::Sequential { .. } => ExecutionMode::Sequential,
            Self::Parallel { cores, base_seed } => ExecutionMode::Parallel { cores, base_seed },
        }
    }
}

/// Read-only state shared by every iteration of one run.
pub struct IterationContext<'a, T: ?Sized, O, E: ?Sized> {
    /// Phylogeny passed through to the estimator.
    pub tree: &'a T,
    /// Whitened residuals and coloring operators.
    pub generator: &'a ReplicateGenerator,
    /// Estimator options.
    pub options: &'a O,
    /// Shift estimator.
    pub estimator: &'a E,
    /// Iterations starting after this instant are skipped.
    pub deadline: Option<Instant>,
}

impl<T, O, E> IterationContext<'_, T, O, E>
where
    T: PhyloTree + ?Sized,
    E: ShiftEstimator<T, O> + ?Sized,
{
    /// Build one replicate and re-estimate on it.
    pub fn run_iteration<R: Rng>(&self, iteration: usize, rng: &mut R) -> IterationOutcome {
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(IterationFailure::DeadlineExceeded);
        }
        let replicate = self.generator.generate(rng);
        reestimate(self.tree, &replicate, self.options, self.estimator, iteration)
    }

    /// Run iteration `iteration` with its own generator seeded `base_seed + iteration`.
    ///
    /// The outcome depends only on the seed, so any single parallel task can
    /// be reproduced in isolation.
    pub fn run_seeded_iteration(&self, iteration: usize, base_seed: u64) -> IterationOutcome {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(iteration_seed(base_seed, iteration));
        self.run_iteration(iteration, &mut rng)
    }
}

/// Run all iterations on one stream, folding each outcome immediately.
pub fn run_sequential<T, O, E>(
    ctx: &IterationContext<'_, T, O, E>,
    iterations: usize,
    seed: Option<u64>,
    counts: &mut DetectionCounts,
) where
    T: PhyloTree + ?Sized,
    E: ShiftEstimator<T, O> + ?Sized,
{
    let mut rng = match seed {
        Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
        None => Xoshiro256PlusPlus::from_rng(&mut rand::rng()),
    };

    for i in 1..=iterations {
        let outcome = ctx.run_iteration(i, &mut rng);
        counts.record(i, outcome);
    }
}

/// Run all iterations on a pool of `cores` workers.
///
/// Returns outcomes in iteration order once every task has finished.
#[cfg(feature = "parallel")]
pub fn run_parallel<T, O, E>(
    ctx: &IterationContext<'_, T, O, E>,
    iterations: usize,
    cores: usize,
    base_seed: u64,
) -> Result<Vec<IterationOutcome>, BootstrapError>
where
    T: PhyloTree + ?Sized,
    O: Sync,
    E: ShiftEstimator<T, O> + ?Sized,
{
    crate::thread_pool::install(cores, || {
        (1..iterations + 1)
            .into_par_iter()
            .map_init(
                // Per-thread generator, reseeded for every iteration
                || Xoshiro256PlusPlus::seed_from_u64(base_seed),
                |rng, i| {
                    *rng = Xoshiro256PlusPlus::seed_from_u64(iteration_seed(base_seed, i));
                    ctx.run_iteration(i, rng)
                },
            )
            .collect()
    })
}

/// Run the per-iteration seeded tasks on the calling thread.
#[cfg(not(feature = "parallel"))]
pub fn run_parallel<T, O, E>(
    ctx: &IterationContext<'_, T, O, E>,
    iterations: usize,
    cores: usize,
    base_seed: u64,
) -> Result<Vec<IterationOutcome>, BootstrapError>
where
    T: PhyloTree + ?Sized,
    O: Sync,
    E: ShiftEstimator<T, O> + ?Sized,
{
    crate::thread_pool::install(cores, || {
        (1..=iterations)
            .map(|i| ctx.run_seeded_iteration(i, base_seed))
            .collect()
    })
}

/// Run `iterations` iterations under `schedule` and return the folded counts.
pub fn execute<T, O, E>(
    ctx: &IterationContext<'_, T, O, E>,
    schedule: Schedule,
    iterations: usize,
    edge_count: usize,
) -> Result<DetectionCounts, BootstrapError>
where
    T: PhyloTree + ?Sized,
    O: Sync,
    E: ShiftEstimator<T, O> + ?Sized,
{
    let mut counts = DetectionCounts::new(edge_count);

    match schedule {
        Schedule::Sequential { seed } => {
            log::debug!("running {iterations} bootstrap iterations sequentially");
            run_sequential(ctx, iterations, seed, &mut counts);
        }
        Schedule::Parallel { cores, base_seed } => {
            log::debug!("running {iterations} bootstrap iterations on {cores} workers (base seed {base_seed})");
            let outcomes = run_parallel(ctx, iterations, cores, base_seed)?;
            for (i, outcome) in outcomes.into_iter().enumerate() {
                counts.record(i + 1, outcome);
            }
        }
    }

    Ok(counts)
}
