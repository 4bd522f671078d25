//! Main `ShiftBootstrap` entry point and builder.

use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::BootstrapError;
use crate::estimate::ShiftEstimator;
use crate::resample::ReplicateGenerator;
use crate::result::{Metadata, SupportResult};
use crate::scheduler::{execute, IterationContext, Schedule};
use crate::transform::{derive_transforms, CovarianceSqrt};
use crate::types::{PhyloTree, ShiftModel, Vector};

/// Bootstrap support for the shift positions of a fitted OU model.
///
/// Use the builder methods to configure the run, then call [`run`](Self::run).
///
/// # Example
///
/// ```ignore
/// use shift_support::{CholeskySqrt, ShiftBootstrap};
///
/// let sqrt = CholeskySqrt::new(|tree: &MyTree, alpha| tree.ou_covariance(alpha));
/// let result = ShiftBootstrap::new()
///     .iterations(200)
///     .multicore(4)
///     .run(&tree, &model, &sqrt, &my_estimator)?;
///
/// for edge in result.supported_edges(0.5) {
///     println!("edge {edge}: {:.2}", result.rate(edge).unwrap());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShiftBootstrap {
    config: Config,
}

impl ShiftBootstrap {
    /// Create with default configuration (100 sequential iterations).
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Create from an explicit configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Set the number of bootstrap replicates.
    pub fn iterations(mut self, n: usize) -> Self {
        self.config.iterations = n;
        self
    }

    /// Run on a pool of `cores` workers with per-iteration seeding.
    pub fn multicore(mut self, cores: usize) -> Self {
        self.config.multicore = true;
        self.config.cores = cores;
        self
    }

    /// Run on a single random stream.
    pub fn sequential(mut self) -> Self {
        self.config.multicore = false;
        self
    }

    /// Seed the sequential stream.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Seed offset for parallel iterations (iteration `i` uses `base_seed + i`).
    pub fn base_seed(mut self, base_seed: u64) -> Self {
        self.config.base_seed = base_seed;
        self
    }

    /// Skip iterations that would start after `ms` milliseconds.
    pub fn max_duration_ms(mut self, ms: u64) -> Self {
        self.config.max_duration_ms = Some(ms);
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the bootstrap.
    ///
    /// Preconditions (configuration, response shape, alpha count) are checked
    /// and the covariance transforms derived before any replicate is drawn;
    /// failures there are returned as errors. Per-iteration estimator
    /// failures are absorbed and listed in [`SupportResult::failures`].
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::NoValidReplicates`] if every iteration failed.
    pub fn run<T, O, S, E>(
        &self,
        tree: &T,
        model: &ShiftModel<O>,
        sqrt: &S,
        estimator: &E,
    ) -> Result<SupportResult, BootstrapError>
    where
        T: PhyloTree + ?Sized,
        O: Sync,
        S: CovarianceSqrt<T> + ?Sized,
        E: ShiftEstimator<T, O> + ?Sized,
    {
        let start = Instant::now();
        self.config.validate()?;

        let generator = prepare_generator(tree, model, sqrt)?;
        let schedule = Schedule::from_config(&self.config);
        let ctx = IterationContext {
            tree,
            generator: &generator,
            options: &model.options,
            estimator,
            deadline: self
                .config
                .max_duration_ms
                .map(|ms| start + Duration::from_millis(ms)),
        };

        let iterations = self.config.iterations;
        let counts = execute(&ctx, schedule, iterations, tree.edge_count())?;
        let rates = counts.rates()?;
        let (counts, valid, failures) = counts.into_parts();

        if !failures.is_empty() {
            log::warn!(
                "{} of {iterations} bootstrap iterations failed and were excluded",
                failures.len()
            );
        }
        let runtime = start.elapsed();
        log::info!(
            "bootstrap finished: {valid}/{iterations} valid replicates in {:.2}s",
            runtime.as_secs_f64()
        );

        Ok(SupportResult {
            rates,
            counts,
            iterations,
            valid_iterations: valid,
            failures,
            metadata: Metadata {
                response: generator.kind(),
                n_obs: model.n_obs(),
                n_dims: model.n_dims(),
                mode: schedule.mode(),
                runtime_secs: runtime.as_secs_f64(),
            },
        })
    }
}

/// Check the model, derive the covariance transforms and whiten residuals.
///
/// Dispatches on the number of response columns: one column takes the
/// univariate path, more take the multivariate path, none is an error.
/// Alpha count is checked before the square-root routine is called.
pub fn prepare_generator<T, O, S>(
    tree: &T,
    model: &ShiftModel<O>,
    sqrt: &S,
) -> Result<ReplicateGenerator, BootstrapError>
where
    T: ?Sized,
    S: CovarianceSqrt<T> + ?Sized,
{
    let (rows, cols) = model.y.shape();
    if rows == 0 || cols == 0 {
        return Err(BootstrapError::EmptyResponse { rows, cols });
    }
    if model.mu.shape() != (rows, cols) {
        return Err(BootstrapError::ShapeMismatch {
            rows,
            cols,
            mu_rows: model.mu.nrows(),
            mu_cols: model.mu.ncols(),
        });
    }
    if model.alpha.len() != cols {
        return Err(BootstrapError::AlphaMismatch {
            expected: cols,
            got: model.alpha.len(),
        });
    }

    let mut transforms = derive_transforms(tree, &model.alpha, rows, sqrt)?;

    if cols == 1 {
        let y: Vector = model.y.column(0).into_owned();
        let mu: Vector = model.mu.column(0).into_owned();
        let transform = transforms.remove(0);
        Ok(ReplicateGenerator::univariate(&y, &mu, transform))
    } else {
        ReplicateGenerator::multivariate(&model.y, &model.mu, transforms)
    }
}
