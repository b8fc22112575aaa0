//! Timeout configuration for compiler invocations
//!
//! Two limits apply:
//! - `verify_seconds`: the `-v` probe run before any job (default 10)
//! - `compile_seconds`: each per-shader compile (default 60)
//!
//! A process that exceeds its limit is terminated and treated as failed.

use std::time::Duration;

/// Upper bound accepted for any timeout (one hour).
pub const MAX_TIMEOUT_SECONDS: u64 = 3600;

/// Timeout configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Limit for the compiler availability probe (default: 10)
    pub verify_seconds: u64,

    /// Limit for a single shader compile (default: 60)
    pub compile_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            verify_seconds: 10,
            compile_seconds: 60,
        }
    }
}

impl TimeoutConfig {
    /// Validate both limits are in (0, MAX_TIMEOUT_SECONDS]
    pub fn validate(&self) -> Result<(), TimeoutValidationError> {
        if self.verify_seconds == 0 || self.verify_seconds > MAX_TIMEOUT_SECONDS {
            return Err(TimeoutValidationError::VerifyOutOfBounds {
                value: self.verify_seconds,
            });
        }

        if self.compile_seconds == 0 || self.compile_seconds > MAX_TIMEOUT_SECONDS {
            return Err(TimeoutValidationError::CompileOutOfBounds {
                value: self.compile_seconds,
            });
        }

        Ok(())
    }

    /// Create from optional overrides, falling back to defaults
    pub fn from_overrides(verify: Option<u64>, compile: Option<u64>) -> Self {
        let defaults = Self::default();
        Self {
            verify_seconds: verify.unwrap_or(defaults.verify_seconds),
            compile_seconds: compile.unwrap_or(defaults.compile_seconds),
        }
    }

    pub fn verify(&self) -> Duration {
        Duration::from_secs(self.verify_seconds)
    }

    pub fn compile(&self) -> Duration {
        Duration::from_secs(self.compile_seconds)
    }
}

/// Timeout validation errors
#[derive(Debug, thiserror::Error)]
pub enum TimeoutValidationError {
    #[error("verify timeout must be in (0, 3600] seconds, got {value}")]
    VerifyOutOfBounds { value: u64 },

    #[error("compile timeout must be in (0, 3600] seconds, got {value}")]
    CompileOutOfBounds { value: u64 },
}
