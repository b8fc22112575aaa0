//! Pipeline orchestration for slang-batch
//!
//! Runs a batch end to end:
//! - Verify the shader compiler answers `-v`
//! - Load and validate the manifest
//! - Plan jobs, setting aside entries with missing sources
//! - Compile on the worker pool
//! - Fold results into a run summary
//!
//! Any failure before the pool starts is fatal and no compile runs.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

use slang_manifest::{LoadedManifest, ManifestError};
use thiserror::Error;

use crate::compiler::{check_compiler, resolve_compiler_path, EnvironmentError, IncludeFlagTemplate};
use crate::job::{plan_jobs, resolve_include_dirs, PathContext, ARTIFACT_EXTENSION};
use crate::runner::{default_workers, CompilerBackend, JobRunner, ProcessBackend, RunnerConfig, RunnerError};
use crate::summary::{generate_run_id, CompileResult, RunSummary, EXIT_FAILURE};
use crate::timeout::{TimeoutConfig, TimeoutValidationError};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid timeout: {0}")]
    Timeout(#[from] TimeoutValidationError),

    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

impl PipelineError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        EXIT_FAILURE
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Compiler path as given on the command line
    pub compiler: PathBuf,

    /// Output directory, relative to the working directory
    pub output_dir: PathBuf,

    /// Manifest path, relative to the working directory
    pub manifest: PathBuf,

    /// Worker pool size
    pub workers: usize,

    pub timeouts: TimeoutConfig,

    pub include_flag: IncludeFlagTemplate,

    /// Where to write run_summary.json, if anywhere
    pub summary_path: Option<PathBuf>,

    /// Suppress per-shader progress lines
    pub quiet: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            compiler: PathBuf::from(crate::compiler::DEFAULT_COMPILER),
            output_dir: PathBuf::from("shaders"),
            manifest: PathBuf::from("shaders.json"),
            workers: default_workers(),
            timeouts: TimeoutConfig::default(),
            include_flag: IncludeFlagTemplate::default(),
            summary_path: None,
            quiet: false,
        }
    }
}

/// Pipeline execution context
pub struct Pipeline {
    config: PipelineConfig,
    ctx: PathContext,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig, ctx: PathContext) -> Self {
        Self { config, ctx }
    }

    /// Check the compiler, then compile every shader with it.
    pub fn execute(&self) -> PipelineResult<RunSummary> {
        self.validate()?;

        let compiler = resolve_compiler_path(&self.config.compiler, &self.ctx.tool_dir);
        self.progress(format_args!("Compiler: {}", compiler.display()));

        let info = check_compiler(&compiler, self.config.timeouts.verify())?;
        self.progress(format_args!("✓ Compiler OK: {}", info.version));

        self.run_with_backend(compiler, ProcessBackend)
    }

    /// Compile every shader through `backend`, skipping the compiler check.
    pub fn run_with_backend<B>(&self, compiler: PathBuf, backend: B) -> PipelineResult<RunSummary>
    where
        B: CompilerBackend + 'static,
    {
        self.validate()?;
        let start = Instant::now();

        let manifest_path = self.ctx.absolute(&self.config.manifest);
        let loaded = LoadedManifest::load(&manifest_path)?;
        self.progress(format_args!(
            "✓ Manifest OK: {} ({} shader(s))",
            manifest_path.display(),
            loaded.manifest.shaders.len()
        ));

        let output_dir = self.ctx.absolute(&self.config.output_dir);
        fs::create_dir_all(&output_dir).map_err(|source| PipelineError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let shader_root = loaded.shader_root();
        if let Some(ref root) = shader_root {
            tracing::info!(root = %root.display(), "using shader root");
        }

        let plan = plan_jobs(&loaded.manifest, shader_root.as_deref(), &self.ctx);
        let include_dirs =
            resolve_include_dirs(&loaded.manifest.include_dirs, shader_root.as_deref(), &self.ctx);

        let mut summary =
            RunSummary::new(generate_run_id(), self.config.workers).with_manifest_digest(&loaded.sha256);

        for missing in &plan.missing {
            self.progress(format_args!("✗ Shader source not found: {}", missing.path.display()));
            summary.record_missing(missing);
        }

        let runner = JobRunner::new(
            RunnerConfig {
                compiler,
                output_dir,
                include_dirs,
                include_flag: self.config.include_flag.clone(),
                global_options: loaded.manifest.common_options.clone(),
                workers: self.config.workers,
                compile_timeout: self.config.timeouts.compile(),
                artifact_extension: ARTIFACT_EXTENSION.to_string(),
            },
            backend,
        );

        self.progress(format_args!(
            "Compiling {} shader(s) with {} worker(s)...",
            plan.jobs.len(),
            self.config.workers
        ));

        let results = runner.run(plan.jobs, |result| self.report(result))?;
        for result in &results {
            summary.record(result);
        }
        summary.set_duration_ms(start.elapsed().as_millis() as u64);

        if let Some(ref path) = self.config.summary_path {
            let path = self.ctx.absolute(path);
            match summary.write_to_file(&path) {
                Ok(()) => tracing::info!(path = %path.display(), "wrote run summary"),
                Err(e) => eprintln!("Warning: could not write {}: {}", path.display(), e),
            }
        }

        Ok(summary)
    }

    fn validate(&self) -> PipelineResult<()> {
        if self.config.workers == 0 {
            return Err(PipelineError::Config("--jobs must be at least 1".to_string()));
        }
        self.config.timeouts.validate()?;
        Ok(())
    }

    fn report(&self, result: &CompileResult) {
        if self.config.quiet {
            return;
        }
        if result.succeeded {
            println!("✓ {} -> {}", result.alias(), result.output_path.display());
        } else {
            println!("✗ {} << {}", result.alias(), result.job.input_path.display());
            for line in result.message.trim().lines() {
                println!("    {}", line);
            }
        }
    }

    fn progress(&self, args: std::fmt::Arguments<'_>) {
        if !self.config.quiet {
            println!("{}", args);
        }
    }
}
