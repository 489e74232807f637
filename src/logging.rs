//! Diagnostic logging setup
//!
//! Library code logs through `tracing`; the binary installs a fmt
//! subscriber on stderr so stdout stays reserved for reports.

use tracing_subscriber::EnvFilter;

/// Default filter directive for the given verbosity flags
///
/// `--quiet` wins over `--verbose`, matching the output verbosity.
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "feraldeps=debug,info"
    } else {
        "warn"
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over the flags when set. Calling this twice
/// is harmless; the second call leaves the first subscriber in place.
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, false), "warn");
        assert_eq!(default_directive(true, false), "feraldeps=debug,info");
        assert_eq!(default_directive(false, true), "error");
        assert_eq!(default_directive(true, true), "error");
    }

    #[test]
    fn test_init_twice() {
        init(false, true);
        init(true, false);
    }
}
