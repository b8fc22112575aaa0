//! Compiler command-line construction
//!
//! Argument order is fixed:
//! `<compiler> [include flags...] [global options...] [shader options...] -o <output> <input>`

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Placeholder substituted with the absolute include directory.
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Default include flag. slangc expects the trailing backslash verbatim.
pub const DEFAULT_INCLUDE_FLAG: &str = "-I{path}\\";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("include flag template must contain {{path}}, got '{0}'")]
    MissingPlaceholder(String),
}

/// Format of the include-directory flag passed to the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeFlagTemplate {
    template: String,
}

impl Default for IncludeFlagTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_INCLUDE_FLAG.to_string(),
        }
    }
}

impl IncludeFlagTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, TemplateError> {
        let template = template.into();
        if !template.contains(PATH_PLACEHOLDER) {
            return Err(TemplateError::MissingPlaceholder(template));
        }
        Ok(Self { template })
    }

    pub fn render(&self, dir: &Path) -> String {
        self.template
            .replace(PATH_PLACEHOLDER, &dir.display().to_string())
    }
}

/// A fully-built compiler command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    /// Build the command line for compiling `input` into `output`.
    ///
    /// `include_dirs` must already be absolute.
    pub fn build(
        program: &Path,
        template: &IncludeFlagTemplate,
        include_dirs: &[PathBuf],
        global_options: &[String],
        shader_options: &[String],
        output: &Path,
        input: &Path,
    ) -> Self {
        let mut args = Vec::with_capacity(
            include_dirs.len() + global_options.len() + shader_options.len() + 3,
        );

        args.extend(include_dirs.iter().map(|dir| template.render(dir)));
        args.extend(global_options.iter().cloned());
        args.extend(shader_options.iter().cloned());
        args.push("-o".to_string());
        args.push(output.display().to_string());
        args.push(input.display().to_string());

        Self {
            program: program.to_path_buf(),
            args,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
