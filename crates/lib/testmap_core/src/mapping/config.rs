//! Mapping policy configuration.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Default similarity cutoff below which a new test is required.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Default number of nearest tests retrieved per request.
pub const DEFAULT_TOP_K: usize = 5;

/// Default time budget for each embedding or generation call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("top_k must be at least 1")]
    InvalidTopK,

    #[error("similarity threshold must be within [-1, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("provider timeout must be non-zero")]
    InvalidTimeout,

    #[error("invalid value for {key}: {value}")]
    Parse { key: &'static str, value: String },
}

/// Process-wide, read-only mapping policy.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingConfig {
    /// Best similarity strictly below this requires a new test.
    pub similarity_threshold: f64,
    /// Number of candidates retrieved and offered to the ranking pass.
    pub top_k: usize,
    /// Time budget for each provider call.
    pub provider_timeout: Duration,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

impl MappingConfig {
    /// Reads configuration from environment variables with defaults.
    ///
    /// | Variable                       | Default |
    /// |--------------------------------|---------|
    /// | `MAPPING_SIMILARITY_THRESHOLD` | `0.7`   |
    /// | `MAPPING_TOP_K`                | `5`     |
    /// | `PROVIDER_TIMEOUT_SECS`        | `60`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let similarity_threshold = parse_env("MAPPING_SIMILARITY_THRESHOLD")?
            .unwrap_or(defaults.similarity_threshold);
        let top_k = parse_env("MAPPING_TOP_K")?.unwrap_or(defaults.top_k);
        let provider_timeout = parse_env::<u64>("PROVIDER_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.provider_timeout);

        Self {
            similarity_threshold,
            top_k,
            provider_timeout,
        }
        .validated()
    }

    /// Check invariants, returning the config unchanged when valid.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::InvalidTopK);
        }
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::InvalidThreshold(self.similarity_threshold));
        }
        if self.provider_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(self)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Parse { key, value }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MappingConfig::default().validated().unwrap();
        assert_eq!(config.similarity_threshold, 0.7);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.provider_timeout, Duration::from_secs(60));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let config = MappingConfig {
            top_k: 0,
            ..MappingConfig::default()
        };
        assert_eq!(config.validated(), Err(ConfigError::InvalidTopK));
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        let config = MappingConfig {
            similarity_threshold: 1.5,
            ..MappingConfig::default()
        };
        assert_eq!(config.validated(), Err(ConfigError::InvalidThreshold(1.5)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = MappingConfig {
            provider_timeout: Duration::ZERO,
            ..MappingConfig::default()
        };
        assert_eq!(config.validated(), Err(ConfigError::InvalidTimeout));
    }
}
