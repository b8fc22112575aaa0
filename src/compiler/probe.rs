//! Compiler availability check
//!
//! Runs `<compiler> -v` once before any job is scheduled. Every way this can
//! go wrong gets its own reason, but callers only branch on `Ok`/`Err`.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use super::VERIFY_FLAG;
use crate::process::{run_with_timeout, ProcessError};

/// Reasons the compiler cannot be used.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("shader compiler not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("shader compiler exited with {}: {stderr}", describe_exit(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("shader compiler did not answer within {seconds}s")]
    TimedOut { seconds: u64 },

    #[error("failed to run shader compiler: {0}")]
    Launch(#[source] io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

/// What the probe learned about a working compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerInfo {
    /// Path that was probed
    pub path: PathBuf,

    /// First non-empty line the compiler printed for `-v`
    pub version: String,
}

/// Verify the compiler starts, exits zero, and answers within `timeout`.
pub fn check_compiler(path: &Path, timeout: Duration) -> Result<CompilerInfo, EnvironmentError> {
    let args = vec![VERIFY_FLAG.to_string()];

    let output = run_with_timeout(path, &args, timeout).map_err(|e| match e {
        ProcessError::NotFound { program } => EnvironmentError::NotFound(program),
        ProcessError::Spawn { source, .. } => EnvironmentError::Launch(source),
        ProcessError::Wait(source) => EnvironmentError::Launch(source),
    })?;

    if output.timed_out() {
        return Err(EnvironmentError::TimedOut {
            seconds: timeout.as_secs(),
        });
    }

    if !output.success() {
        return Err(EnvironmentError::NonZeroExit {
            code: output.exit_code(),
            stderr: output.stderr.trim().to_string(),
        });
    }

    let version = output
        .stdout
        .lines()
        .chain(output.stderr.lines())
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(path = %path.display(), %version, "compiler check passed");

    Ok(CompilerInfo {
        path: path.to_path_buf(),
        version,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn fake_compiler(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("slangc");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_working_compiler_reports_version() {
        let dir = TempDir::new().unwrap();
        let compiler = fake_compiler(&dir, "echo 'v2025.6.1'");

        let info = check_compiler(&compiler, Duration::from_secs(5)).unwrap();
        assert_eq!(info.version, "v2025.6.1");
        assert_eq!(info.path, compiler);
    }

    #[test]
    fn test_version_on_stderr_is_accepted() {
        let dir = TempDir::new().unwrap();
        let compiler = fake_compiler(&dir, "echo 'slang 2025.6' >&2");

        let info = check_compiler(&compiler, Duration::from_secs(5)).unwrap();
        assert_eq!(info.version, "slang 2025.6");
    }

    #[test]
    fn test_non_zero_exit_is_reported() {
        let dir = TempDir::new().unwrap();
        let compiler = fake_compiler(&dir, "echo 'bad install' >&2; exit 2");

        let err = check_compiler(&compiler, Duration::from_secs(5)).unwrap_err();
        match err {
            EnvironmentError::NonZeroExit { code, stderr } => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "bad install");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_hanging_compiler_times_out() {
        let dir = TempDir::new().unwrap();
        let compiler = fake_compiler(&dir, "exec sleep 30");

        let err = check_compiler(&compiler, Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, EnvironmentError::TimedOut { .. }));
    }

    #[test]
    fn test_missing_compiler() {
        let dir = TempDir::new().unwrap();
        let err = check_compiler(&dir.path().join("nope"), Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, EnvironmentError::NotFound(_)));
    }
}
