//! Diagnostic output on stderr
//!
//! Recoverable failures (unreadable files, broken repositories, failed
//! ignore queries) are reported as `warn` events; traversal decisions are
//! `debug`. `RUST_LOG` overrides the level chosen on the command line.

use tracing_subscriber::EnvFilter;

/// Map a verbosity count to a tracing level directive
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    }
}

/// Install the stderr subscriber; later calls are no-ops
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0), "error");
        assert_eq!(level_for(1), "warn");
        assert_eq!(level_for(2), "info");
        assert_eq!(level_for(3), "debug");
        assert_eq!(level_for(9), "debug");
    }
}
