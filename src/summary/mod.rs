//! Compile results and run summary

mod failure;
mod result;
mod run_summary;

pub use failure::{FailureKind, EXIT_FAILURE, EXIT_SUCCESS};
pub use result::CompileResult;
pub use run_summary::{FailureRecord, RunSummary, RUN_SUMMARY_SCHEMA_ID, RUN_SUMMARY_SCHEMA_VERSION};

/// Generate a new run_id using ULID
pub fn generate_run_id() -> String {
    ulid::Ulid::new().to_string().to_lowercase()
}
