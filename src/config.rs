//! Configuration for bootstrap runs.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::BootstrapError;

/// Seed offset for per-iteration generators in parallel mode.
///
/// Iteration `i` (1-based) is seeded with `base_seed + i`.
pub const DEFAULT_BASE_SEED: u64 = 101;

/// Configuration options for [`ShiftBootstrap`](crate::ShiftBootstrap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of bootstrap replicates (default: 100).
    pub iterations: usize,

    /// Run iterations on a worker pool instead of one sequential stream.
    pub multicore: bool,

    /// Worker pool size when `multicore` is set (default: 2).
    pub cores: usize,

    /// Seed offset for per-iteration generators in parallel mode (default: 101).
    pub base_seed: u64,

    /// Seed for the single stream in sequential mode.
    ///
    /// `None` seeds from the thread-local generator, so sequential runs
    /// are only reproducible when this is set.
    pub seed: Option<u64>,

    /// Optional guardrail for max duration in milliseconds.
    ///
    /// Iterations that would start after the deadline are skipped and
    /// reported as failures.
    pub max_duration_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            iterations: 100,
            multicore: false,
            cores: 2,
            base_seed: DEFAULT_BASE_SEED,
            seed: None,
            max_duration_ms: None,
        }
    }
}

impl Config {
    /// Small run for smoke checks: 20 replicates, sequential.
    pub fn quick() -> Self {
        Self {
            iterations: 20,
            ..Self::default()
        }
    }

    /// Parallel run on all logical CPUs.
    pub fn parallel() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            multicore: true,
            cores,
            ..Self::default()
        }
    }

    /// Merge configuration from environment variables.
    ///
    /// Recognised: `SB_ITERATIONS`, `SB_MULTICORE`, `SB_CORES`, `SB_SEED`,
    /// `SB_BASE_SEED`, `SB_MAX_DURATION_MS`. Unparseable values are ignored.
    pub fn from_env(mut self) -> Self {
        if let Some(n) = parse_usize_env("SB_ITERATIONS") {
            self.iterations = n;
        }
        if let Some(flag) = parse_bool_env("SB_MULTICORE") {
            self.multicore = flag;
        }
        if let Some(n) = parse_usize_env("SB_CORES") {
            self.cores = n;
        }
        if let Some(seed) = parse_u64_env("SB_SEED") {
            self.seed = Some(seed);
        }
        if let Some(seed) = parse_u64_env("SB_BASE_SEED") {
            self.base_seed = seed;
        }
        if let Some(ms) = parse_u64_env("SB_MAX_DURATION_MS") {
            self.max_duration_ms = Some(ms);
        }
        self
    }

    /// Check the invariants the scheduler relies on.
    pub fn validate(&self) -> Result<(), BootstrapError> {
        if self.iterations == 0 {
            return Err(BootstrapError::InvalidConfig(
                "iterations must be at least 1".to_string(),
            ));
        }
        if self.multicore && self.cores == 0 {
            return Err(BootstrapError::InvalidConfig(
                "cores must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_usize_env(key: &str) -> Option<usize> {
    env::var(key).ok()?.parse().ok()
}

fn parse_u64_env(key: &str) -> Option<u64> {
    env::var(key).ok()?.parse().ok()
}

fn parse_bool_env(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.iterations, 100);
        assert!(!config.multicore);
        assert_eq!(config.base_seed, 101);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let config = Config {
            iterations: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(BootstrapError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_cores_rejected_only_when_multicore() {
        let sequential = Config {
            cores: 0,
            ..Config::default()
        };
        assert!(sequential.validate().is_ok());

        let parallel = Config {
            cores: 0,
            multicore: true,
            ..Config::default()
        };
        assert!(parallel.validate().is_err());
    }

    #[test]
    fn test_from_env_merges_and_ignores_garbage() {
        // Only this test touches the SB_* variables.
        env::set_var("SB_ITERATIONS", "250");
        env::set_var("SB_MULTICORE", "true");
        env::set_var("SB_CORES", "not-a-number");
        env::set_var("SB_BASE_SEED", "7");

        let config = Config::default().from_env();

        env::remove_var("SB_ITERATIONS");
        env::remove_var("SB_MULTICORE");
        env::remove_var("SB_CORES");
        env::remove_var("SB_BASE_SEED");

        assert_eq!(config.iterations, 250);
        assert!(config.multicore);
        assert_eq!(config.cores, 2);
        assert_eq!(config.base_seed, 7);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_parallel_preset_has_cores() {
        let config = Config::parallel();
        assert!(config.multicore);
        assert!(config.cores >= 1);
    }
}
