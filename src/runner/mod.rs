//! Parallel job runner
//!
//! Fans compile jobs out over a fixed-size thread pool and hands results
//! back to the caller in completion order. Each job holds one pool thread
//! for its whole lifetime, so at most `workers` compilers run at once.
//! A failed job never aborts the rest of the batch, and nothing is retried.

mod backend;

pub use backend::{CompileOutcome, CompilerBackend, ProcessBackend};

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel;
use thiserror::Error;

use crate::compiler::{IncludeFlagTemplate, Invocation};
use crate::job::{CompileJob, ARTIFACT_EXTENSION};
use crate::summary::{CompileResult, FailureKind};
use crate::timeout::TimeoutConfig;

/// Errors that prevent the runner from starting.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Everything a job needs besides its own descriptor.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Compiler binary
    pub compiler: PathBuf,

    /// Directory artifacts are written to
    pub output_dir: PathBuf,

    /// Absolute include directories
    pub include_dirs: Vec<PathBuf>,

    pub include_flag: IncludeFlagTemplate,

    /// Options passed to every compile, before per-shader options
    pub global_options: Vec<String>,

    /// Pool size
    pub workers: usize,

    /// Limit for one compile
    pub compile_timeout: Duration,

    /// Extension of compiled artifacts
    pub artifact_extension: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            compiler: PathBuf::from(crate::compiler::DEFAULT_COMPILER),
            output_dir: PathBuf::from("."),
            include_dirs: Vec::new(),
            include_flag: IncludeFlagTemplate::default(),
            global_options: Vec::new(),
            workers: default_workers(),
            compile_timeout: TimeoutConfig::default().compile(),
            artifact_extension: ARTIFACT_EXTENSION.to_string(),
        }
    }
}

/// Default pool size: one worker per logical CPU.
pub fn default_workers() -> usize {
    num_cpus::get().max(1)
}

/// Executes compile jobs on a bounded pool.
pub struct JobRunner<B> {
    config: Arc<RunnerConfig>,
    backend: Arc<B>,
}

impl<B> Clone for JobRunner<B> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: CompilerBackend + 'static> JobRunner<B> {
    pub fn new(config: RunnerConfig, backend: B) -> Self {
        Self {
            config: Arc::new(config),
            backend: Arc::new(backend),
        }
    }

    /// Run one job to completion on the calling thread.
    ///
    /// A failed job never leaves a file at its output path.
    pub fn execute(&self, job: CompileJob) -> CompileResult {
        let start = Instant::now();
        let config = &self.config;
        let Some(output_path) = job.output_path(&config.output_dir, &config.artifact_extension) else {
            let message = format!("alias '{}' does not name an output file", job.output_alias);
            return CompileResult::failure(
                job,
                config.output_dir.clone(),
                FailureKind::InvalidOutputName,
                message,
                0,
            );
        };

        let invocation = Invocation::build(
            &config.compiler,
            &config.include_flag,
            &config.include_dirs,
            &config.global_options,
            &job.per_file_options,
            &output_path,
            &job.input_path,
        );
        tracing::debug!(alias = %job.output_alias, command = %invocation, "compiling");

        let outcome = self.backend.compile(&invocation, config.compile_timeout);
        let duration_ms = start.elapsed().as_millis() as u64;

        let (kind, message) = match outcome {
            CompileOutcome::Success { stdout } => {
                return CompileResult::success(job, output_path, stdout, duration_ms);
            }
            CompileOutcome::Failed { code, stderr } => {
                let message = if stderr.trim().is_empty() {
                    match code {
                        Some(code) => format!("compiler exited with code {}", code),
                        None => "compiler terminated by a signal".to_string(),
                    }
                } else {
                    stderr
                };
                (FailureKind::CompileFailed, message)
            }
            CompileOutcome::TimedOut => (
                FailureKind::TimedOut,
                format!(
                    "compilation timed out after {}s",
                    config.compile_timeout.as_secs()
                ),
            ),
            CompileOutcome::LaunchFailed(error) => (FailureKind::LaunchFailed, error),
        };

        remove_stale_artifact(&output_path);
        CompileResult::failure(job, output_path, kind, message, duration_ms)
    }

    /// Submit every job to the pool and wait for all of them.
    ///
    /// `on_result` is called on the calling thread as each job finishes. The
    /// returned results are in completion order; there is exactly one per
    /// submitted job.
    pub fn run<F>(&self, jobs: Vec<CompileJob>, mut on_result: F) -> Result<Vec<CompileResult>, RunnerError>
    where
        F: FnMut(&CompileResult),
    {
        if self.config.workers == 0 {
            return Err(RunnerError::NoWorkers);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("slang-worker-{}", i))
            .build()?;

        let (tx, rx) = channel::unbounded::<(usize, CompileResult)>();
        let mut pending: Vec<Option<CompileJob>> = Vec::with_capacity(jobs.len());

        tracing::info!(jobs = jobs.len(), workers = self.config.workers, "submitting compile jobs");

        for (index, job) in jobs.into_iter().enumerate() {
            pending.push(Some(job.clone()));
            let runner = self.clone();
            let tx = tx.clone();
            pool.spawn(move || {
                let fallback = job.clone();
                let result = panic::catch_unwind(AssertUnwindSafe(|| runner.execute(job)))
                    .unwrap_or_else(|payload| runner.unexpected(fallback, &panic_message(&*payload)));
                let _ = tx.send((index, result));
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(pending.len());
        for (index, result) in rx.iter() {
            pending[index] = None;
            on_result(&result);
            results.push(result);
        }

        // Every sender is gone; anything still pending never reported back.
        for job in pending.into_iter().flatten() {
            let result = self.unexpected(job, "compile task ended without reporting a result");
            on_result(&result);
            results.push(result);
        }

        Ok(results)
    }

    fn unexpected(&self, job: CompileJob, reason: &str) -> CompileResult {
        let output_path = match job.output_path(&self.config.output_dir, &self.config.artifact_extension) {
            Some(path) => {
                remove_stale_artifact(&path);
                path
            }
            None => self.config.output_dir.clone(),
        };
        CompileResult::failure(job, output_path, FailureKind::Unexpected, reason, 0)
    }
}

fn remove_stale_artifact(path: &Path) {
    if !path.exists() {
        return;
    }
    match fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "removed artifact of failed compile"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not remove artifact of failed compile"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("compile task panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("compile task panicked: {}", s)
    } else {
        "compile task panicked".to_string()
    }
}
