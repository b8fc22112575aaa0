//! Per-job failure taxonomy and exit codes

use serde::{Deserialize, Serialize};

/// Exit code when every shader compiled.
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for any fatal error or any failed/skipped shader.
pub const EXIT_FAILURE: i32 = 1;

/// Failure kind - categorizes why a shader did not compile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Source file missing; the job was never submitted
    InputMissing,
    /// Alias does not name an output file; the compiler was not run
    InvalidOutputName,
    /// Compiler exited non-zero
    CompileFailed,
    /// Compiler exceeded the compile timeout
    TimedOut,
    /// Compiler could not be started
    LaunchFailed,
    /// The job panicked or its result was lost
    Unexpected,
}

impl FailureKind {
    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            FailureKind::InputMissing => "Shader source not found",
            FailureKind::InvalidOutputName => "Invalid output name",
            FailureKind::CompileFailed => "Compilation failed",
            FailureKind::TimedOut => "Compilation timed out",
            FailureKind::LaunchFailed => "Compiler could not be started",
            FailureKind::Unexpected => "Unexpected task error",
        }
    }

    /// Whether the job reached the worker pool
    pub fn was_submitted(&self) -> bool {
        !matches!(self, FailureKind::InputMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_serialization() {
        let json = serde_json::to_string(&FailureKind::InputMissing).unwrap();
        assert_eq!(json, "\"INPUT_MISSING\"");

        let kind: FailureKind = serde_json::from_str("\"TIMED_OUT\"").unwrap();
        assert_eq!(kind, FailureKind::TimedOut);
    }

    #[test]
    fn test_only_missing_inputs_are_unsubmitted() {
        assert!(!FailureKind::InputMissing.was_submitted());
        assert!(FailureKind::CompileFailed.was_submitted());
        assert!(FailureKind::Unexpected.was_submitted());
    }
}
