//! Diagnostic logging
//!
//! Progress and the final report are printed directly; `tracing` carries
//! the diagnostics (resolved paths, command lines, artifact cleanup) to
//! stderr. `RUST_LOG` wins over the verbosity flags when set.

use tracing_subscriber::EnvFilter;

/// Log level implied by the command-line verbosity flags.
pub fn default_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(0, false), "warn");
        assert_eq!(default_level(1, false), "info");
        assert_eq!(default_level(2, false), "debug");
        assert_eq!(default_level(5, false), "trace");
        assert_eq!(default_level(3, true), "error");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init(0, true);
        init(1, false);
    }
}
