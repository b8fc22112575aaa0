//! External shader compiler
//!
//! Resolves which compiler binary to run, checks that it works, and builds
//! the argument list for a single compile.

mod invocation;
mod probe;

pub use invocation::{IncludeFlagTemplate, Invocation, TemplateError, DEFAULT_INCLUDE_FLAG};
pub use probe::{check_compiler, CompilerInfo, EnvironmentError};

use std::path::{Path, PathBuf};

/// Compiler looked up on `PATH` when the configured one does not exist.
pub const DEFAULT_COMPILER: &str = "slangc";

/// Flag that makes the compiler print its version and exit.
pub const VERIFY_FLAG: &str = "-v";

/// Resolve the compiler path given on the command line.
///
/// Absolute paths are used as is; relative paths are taken relative to the
/// directory holding this tool. If the result does not exist the bare
/// `slangc` name is returned so the `PATH` lookup gets a chance.
pub fn resolve_compiler_path(given: &Path, tool_dir: &Path) -> PathBuf {
    let candidate = if given.is_absolute() {
        given.to_path_buf()
    } else {
        tool_dir.join(given)
    };

    if candidate.exists() {
        candidate
    } else {
        tracing::warn!(
            path = %candidate.display(),
            fallback = DEFAULT_COMPILER,
            "compiler not found, falling back to PATH lookup"
        );
        PathBuf::from(DEFAULT_COMPILER)
    }
}
