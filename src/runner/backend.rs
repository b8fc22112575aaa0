//! Compiler backends
//!
//! The runner talks to the compiler through `CompilerBackend` so the pool
//! can be driven without a real shader compiler.

use std::time::Duration;

use crate::compiler::Invocation;
use crate::process::run_with_timeout;

/// What a single compiler invocation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Exit code zero
    Success { stdout: String },
    /// Non-zero exit (or killed by a signal)
    Failed { code: Option<i32>, stderr: String },
    /// Exceeded the compile timeout
    TimedOut,
    /// The process could not be started
    LaunchFailed(String),
}

/// Runs one compiler invocation to completion.
pub trait CompilerBackend: Send + Sync {
    fn compile(&self, invocation: &Invocation, timeout: Duration) -> CompileOutcome;
}

/// Backend that spawns the real compiler process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessBackend;

impl CompilerBackend for ProcessBackend {
    fn compile(&self, invocation: &Invocation, timeout: Duration) -> CompileOutcome {
        match run_with_timeout(&invocation.program, &invocation.args, timeout) {
            Ok(output) if output.success() => CompileOutcome::Success {
                stdout: output.stdout,
            },
            Ok(output) if output.timed_out() => CompileOutcome::TimedOut,
            Ok(output) => {
                if let Some(signal) = output.term_signal() {
                    tracing::warn!(%signal, program = %invocation.program.display(), "compiler killed by signal");
                }
                CompileOutcome::Failed {
                    code: output.exit_code(),
                    stderr: output.stderr,
                }
            }
            Err(e) => CompileOutcome::LaunchFailed(e.to_string()),
        }
    }
}
