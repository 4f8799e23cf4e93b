//! Configuration management and environment variable loading

use crate::{LsaError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Default number of semantic dimensions kept by the projector
pub const DEFAULT_COMPONENTS: usize = 100;

/// Default number of hits returned per query
pub const DEFAULT_TOP_K: usize = 5;

/// Default seed for the projector's random test matrix
pub const DEFAULT_SEED: u64 = 42;

/// Load environment variables from .env file
///
/// Looks in the current directory and its parents. A missing file is not an
/// error; a malformed one is.
///
/// # Example
///
/// ```no_run
/// use lsa_core::load_env;
///
/// load_env().ok();
/// let components = std::env::var("LSA_COMPONENTS").unwrap_or_default();
/// ```
pub fn load_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::info!("Loaded environment from: {}", path.display());
            Ok(())
        }
        Err(dotenvy::Error::LineParse(line, pos)) => Err(LsaError::config(format!(
            "Failed to parse .env file at line {}, position {}",
            line, pos
        ))),
        Err(dotenvy::Error::Io(_)) => {
            tracing::debug!("No .env file found - using system environment variables only");
            Ok(())
        }
        Err(e) => Err(LsaError::config(format!("Failed to load .env file: {}", e))),
    }
}

/// Load `KEY=value` pairs from `path`, keeping variables that are already set
///
/// Returns how many variables were added. A missing or malformed file is a
/// configuration error.
pub fn load_env_from_path<P: AsRef<Path>>(path: P) -> Result<usize> {
    let path = path.as_ref();
    let entries = dotenvy::from_path_iter(path).map_err(|e| {
        LsaError::config(format!("cannot open env file {}: {}", path.display(), e))
    })?;

    let mut loaded = 0;
    for entry in entries {
        let (key, value) = entry.map_err(|e| {
            LsaError::config(format!("malformed env file {}: {}", path.display(), e))
        })?;
        if env::var_os(&key).is_none() {
            env::set_var(&key, value);
            loaded += 1;
        }
    }

    tracing::info!("Loaded {} variables from {}", loaded, path.display());
    Ok(loaded)
}

/// Get optional environment variable with default
pub fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get environment variable as integer
pub fn get_env_int<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Parameters of the index build and query pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of semantic dimensions (rank k of the truncated SVD)
    pub n_components: usize,

    /// Default number of hits returned by a query
    pub top_k: usize,

    /// Seed for the projector's random test matrix
    pub seed: u64,

    /// Power iterations run by the randomized range finder
    pub n_iter: usize,

    /// Extra random vectors sampled beyond `n_components`
    pub n_oversamples: usize,

    /// Shortest token kept by the tokenizer
    pub min_token_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_components: DEFAULT_COMPONENTS,
            top_k: DEFAULT_TOP_K,
            seed: DEFAULT_SEED,
            n_iter: 5,
            n_oversamples: 10,
            min_token_len: 2,
        }
    }
}

impl SearchConfig {
    /// Build a config from `LSA_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            n_components: get_env_int("LSA_COMPONENTS", defaults.n_components),
            top_k: get_env_int("LSA_TOP_K", defaults.top_k),
            seed: get_env_int("LSA_SEED", defaults.seed),
            n_iter: get_env_int("LSA_POWER_ITERATIONS", defaults.n_iter),
            n_oversamples: get_env_int("LSA_OVERSAMPLES", defaults.n_oversamples),
            min_token_len: get_env_int("LSA_MIN_TOKEN_LEN", defaults.min_token_len),
        }
    }

    /// Set the number of semantic dimensions
    pub fn with_components(mut self, n_components: usize) -> Self {
        self.n_components = n_components;
        self
    }

    /// Set the default number of hits
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the projector seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject values that can never produce a usable index
    pub fn validate(&self) -> Result<()> {
        if self.n_components == 0 {
            return Err(LsaError::config("n_components must be at least 1"));
        }
        if self.top_k == 0 {
            return Err(LsaError::config("top_k must be at least 1"));
        }
        if self.min_token_len == 0 {
            return Err(LsaError::config("min_token_len must be at least 1"));
        }
        Ok(())
    }
}
