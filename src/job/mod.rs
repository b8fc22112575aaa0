//! Compile jobs and job planning
//!
//! Turns manifest entries into `CompileJob`s. Entries whose source file does
//! not exist are set aside during planning and never reach the worker pool.

mod output;

pub use output::{output_file_name, output_path, ARTIFACT_EXTENSION};

use slang_manifest::Manifest;
use std::path::{Path, PathBuf};

/// One shader's compilation task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileJob {
    /// Resolved source file (exists at planning time)
    pub input_path: PathBuf,

    /// Name the output artifact is derived from
    pub output_alias: String,

    /// Options passed only for this shader
    pub per_file_options: Vec<String>,
}

impl CompileJob {
    /// Artifact path, or `None` if the alias does not name a file.
    pub fn output_path(&self, output_dir: &Path, extension: &str) -> Option<PathBuf> {
        output_path(output_dir, &self.output_alias, extension)
    }
}

/// A manifest entry whose source file could not be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingInput {
    pub alias: String,
    pub path: PathBuf,
}

/// Result of planning a manifest.
#[derive(Debug, Clone, Default)]
pub struct JobPlan {
    /// Jobs ready to submit, in manifest order
    pub jobs: Vec<CompileJob>,

    /// Entries skipped because their source file is missing
    pub missing: Vec<MissingInput>,
}

impl JobPlan {
    /// Number of manifest entries covered by the plan.
    pub fn total(&self) -> usize {
        self.jobs.len() + self.missing.len()
    }
}

/// Where relative paths are anchored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathContext {
    /// Directory shader files resolve against when no shader root is set
    pub tool_dir: PathBuf,

    /// Working directory of the invocation
    pub working_dir: PathBuf,
}

impl PathContext {
    /// Build from the running executable and the current directory.
    pub fn from_env() -> std::io::Result<Self> {
        let working_dir = std::env::current_dir()?;
        let tool_dir = std::env::current_exe()?
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| working_dir.clone());
        Ok(Self {
            tool_dir,
            working_dir,
        })
    }

    /// Make `path` absolute against the working directory.
    pub fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}

/// Resolve every manifest entry to a job or a missing input.
///
/// `shader_root` is the manifest's root already joined onto the manifest
/// directory; without one, files resolve against the tool's directory.
pub fn plan_jobs(manifest: &Manifest, shader_root: Option<&Path>, ctx: &PathContext) -> JobPlan {
    let mut plan = JobPlan::default();

    for entry in &manifest.shaders {
        let joined = match shader_root {
            Some(root) => ctx.absolute(root).join(&entry.file),
            None => ctx.tool_dir.join(&entry.file),
        };

        if !joined.is_file() {
            tracing::debug!(path = %joined.display(), "shader source missing");
            plan.missing.push(MissingInput {
                alias: entry.output_alias().to_string(),
                path: joined,
            });
            continue;
        }

        let input_path = joined.canonicalize().unwrap_or(joined);
        plan.jobs.push(CompileJob {
            input_path,
            output_alias: entry.output_alias().to_string(),
            per_file_options: entry.options.clone(),
        });
    }

    plan
}

/// Absolute include directories, anchored at the shader root if there is one
/// and at the working directory otherwise.
pub fn resolve_include_dirs(
    include_dirs: &[String],
    shader_root: Option<&Path>,
    ctx: &PathContext,
) -> Vec<PathBuf> {
    let base = match shader_root {
        Some(root) => ctx.absolute(root),
        None => ctx.working_dir.clone(),
    };
    include_dirs.iter().map(|dir| base.join(dir)).collect()
}
