//! slang-batch - parallel Slang shader compilation
//!
//! Reads a JSON manifest of shaders and compiler options, checks that the
//! shader compiler works, then compiles every shader on a bounded worker
//! pool and reports how many succeeded.

pub mod compiler;
pub mod job;
pub mod logging;
pub mod pipeline;
pub mod process;
pub mod runner;
pub mod summary;
pub mod timeout;

pub use compiler::{check_compiler, CompilerInfo, EnvironmentError, IncludeFlagTemplate, Invocation};
pub use job::{CompileJob, JobPlan, PathContext};
pub use pipeline::{Pipeline, PipelineConfig, PipelineError};
pub use runner::{CompileOutcome, CompilerBackend, JobRunner, ProcessBackend, RunnerConfig};
pub use slang_manifest::{Manifest, ManifestError};
pub use summary::{CompileResult, FailureKind, RunSummary};
pub use timeout::TimeoutConfig;
