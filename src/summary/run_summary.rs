//! Run summary (run_summary.json)
//!
//! Folded from compile results in whatever order they complete. At the end
//! of a run `success_count + failure_count == total`, where `total` counts
//! every manifest entry, submitted or skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use super::failure::{FailureKind, EXIT_FAILURE, EXIT_SUCCESS};
use super::result::CompileResult;
use crate::job::MissingInput;

/// Schema version for run_summary.json
pub const RUN_SUMMARY_SCHEMA_VERSION: u32 = 1;

/// Schema identifier for run_summary.json
pub const RUN_SUMMARY_SCHEMA_ID: &str = "slang-batch/run_summary@1";

/// One failed shader, as recorded in the summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub alias: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Run summary (run_summary.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// Run identifier
    pub run_id: String,

    /// When the summary was created
    pub created_at: DateTime<Utc>,

    /// SHA-256 of the manifest bytes, when read from a file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_sha256: Option<String>,

    /// Worker pool size used for the run
    pub workers: usize,

    /// Manifest entries accounted for (submitted + skipped)
    pub total: usize,

    /// Jobs handed to the worker pool
    pub submitted_count: usize,

    pub success_count: usize,

    /// Includes skipped entries
    pub failure_count: usize,

    /// Entries skipped for a missing source file
    pub skipped_count: usize,

    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,

    /// Failed shaders in completion order
    pub failures: Vec<FailureRecord>,
}

impl RunSummary {
    /// Start an empty summary for a run with `workers` pool threads
    pub fn new(run_id: String, workers: usize) -> Self {
        Self {
            schema_version: RUN_SUMMARY_SCHEMA_VERSION,
            schema_id: RUN_SUMMARY_SCHEMA_ID.to_string(),
            run_id,
            created_at: Utc::now(),
            manifest_sha256: None,
            workers,
            total: 0,
            submitted_count: 0,
            success_count: 0,
            failure_count: 0,
            skipped_count: 0,
            duration_ms: 0,
            failures: Vec::new(),
        }
    }

    pub fn with_manifest_digest(mut self, sha256: impl Into<String>) -> Self {
        self.manifest_sha256 = Some(sha256.into());
        self
    }

    /// Count an entry that was skipped before submission
    pub fn record_missing(&mut self, missing: &MissingInput) {
        self.total += 1;
        self.skipped_count += 1;
        self.failure_count += 1;
        self.failures.push(FailureRecord {
            alias: missing.alias.clone(),
            kind: FailureKind::InputMissing,
            message: format!("shader source not found: {}", missing.path.display()),
        });
    }

    /// Fold in the result of a submitted job
    pub fn record(&mut self, result: &CompileResult) {
        self.total += 1;
        self.submitted_count += 1;
        if result.succeeded {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
            self.failures.push(FailureRecord {
                alias: result.alias().to_string(),
                kind: result.failure_kind.unwrap_or(FailureKind::Unexpected),
                message: result.message.trim().to_string(),
            });
        }
    }

    pub fn set_duration_ms(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
    }

    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }

    /// Generate a human-readable summary
    pub fn human_summary(&self) -> String {
        if self.is_success() {
            format!("All {} shader(s) compiled", self.success_count)
        } else if self.skipped_count > 0 {
            format!(
                "{} of {} shader(s) failed ({} missing source)",
                self.failure_count, self.total, self.skipped_count
            )
        } else {
            format!("{} of {} shader(s) failed", self.failure_count, self.total)
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e))
        })?;
        fs::write(path, json)
    }
}
