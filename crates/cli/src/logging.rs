//! Logging setup
//!
//! Logs go to stderr so that stdout carries only dashboard output.
//! `RUST_LOG` wins over the verbosity flag when set.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Subscriber options taken from the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingConfig {
    /// Emit one JSON object per event
    pub json: bool,
    /// `-v` count: 0 info, 1 debug, 2+ trace
    pub verbosity: u8,
}

impl LoggingConfig {
    /// Default directive for the verbosity level
    pub const fn level(&self) -> &'static str {
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    fn filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level()))
    }
}

/// Install the global subscriber
pub fn init(config: LoggingConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_writer(std::io::stderr)
        .with_target(config.verbosity > 0);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("installing log subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let level = |verbosity| LoggingConfig { json: false, verbosity }.level();
        assert_eq!(level(0), "info");
        assert_eq!(level(1), "debug");
        assert_eq!(level(7), "trace");
    }
}
