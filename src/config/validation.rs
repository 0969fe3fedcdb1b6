//! Configuration validation.
//!
//! Semantic checks on an already-deserialized config (serde handles the
//! syntactic ones). Returns all violations, not just the first, so an
//! operator can fix a config file in one pass.

use thiserror::Error;

use crate::config::schema::ResilienceConfig;

/// A single semantic violation in a config.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("max_concurrent_requests must be at least 1")]
    ZeroConcurrency,

    #[error("failure_threshold must be at least 1")]
    ZeroFailureThreshold,

    #[error("recovery_timeout_ms must be greater than 0")]
    ZeroRecoveryTimeout,

    #[error("default_timeout_ms must be greater than 0")]
    ZeroDefaultTimeout,

    #[error("backoff_base_ms must be greater than 0")]
    ZeroBackoffBase,

    #[error("backoff_max_ms ({max}) must not be below backoff_base_ms ({base})")]
    BackoffCapBelowBase { base: u64, max: u64 },

    #[error("backoff_jitter ({0}) must be within [0.0, 1.0]")]
    JitterOutOfRange(f64),
}

/// Validate a config. Pure function: collects every violation.
pub fn validate_config(config: &ResilienceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.max_concurrent_requests == 0 {
        errors.push(ValidationError::ZeroConcurrency);
    }
    if config.failure_threshold == 0 {
        errors.push(ValidationError::ZeroFailureThreshold);
    }
    if config.recovery_timeout_ms == 0 {
        errors.push(ValidationError::ZeroRecoveryTimeout);
    }
    if config.default_timeout_ms == 0 {
        errors.push(ValidationError::ZeroDefaultTimeout);
    }
    if config.backoff_base_ms == 0 {
        errors.push(ValidationError::ZeroBackoffBase);
    }
    if config.backoff_max_ms < config.backoff_base_ms {
        errors.push(ValidationError::BackoffCapBelowBase {
            base: config.backoff_base_ms,
            max: config.backoff_max_ms,
        });
    }
    if !(0.0..=1.0).contains(&config.backoff_jitter) {
        errors.push(ValidationError::JitterOutOfRange(config.backoff_jitter));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
