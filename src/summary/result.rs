//! Outcome of one compile job

use std::path::PathBuf;

use super::failure::FailureKind;
use crate::job::CompileJob;

/// Result of executing one `CompileJob`. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct CompileResult {
    pub job: CompileJob,

    /// Where the artifact was (or would have been) written; the output
    /// directory itself when the alias names no file
    pub output_path: PathBuf,

    pub succeeded: bool,

    /// Compiler stdout on success; stderr or an error description on failure
    pub message: String,

    pub failure_kind: Option<FailureKind>,

    pub duration_ms: u64,
}

impl CompileResult {
    pub fn success(job: CompileJob, output_path: PathBuf, stdout: String, duration_ms: u64) -> Self {
        Self {
            job,
            output_path,
            succeeded: true,
            message: stdout,
            failure_kind: None,
            duration_ms,
        }
    }

    pub fn failure(
        job: CompileJob,
        output_path: PathBuf,
        kind: FailureKind,
        message: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            job,
            output_path,
            succeeded: false,
            message: message.into(),
            failure_kind: Some(kind),
            duration_ms,
        }
    }

    pub fn alias(&self) -> &str {
        &self.job.output_alias
    }
}
