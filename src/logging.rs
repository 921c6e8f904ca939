//! Diagnostic logging via `tracing`.
//!
//! Logs go to stderr; stdout is reserved for the run's status lines.
//! `RUST_LOG` overrides the level chosen by `-v` flags.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::EnvFilter;

pub fn level_for_verbosity(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn init_logging(verbose: u8) -> Result<()> {
    let level = level_for_verbosity(verbose);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_str().to_lowercase();
        EnvFilter::new(format!("warn,metadata_remapper={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for_verbosity(0), Level::WARN);
        assert_eq!(level_for_verbosity(2), Level::DEBUG);
        assert_eq!(level_for_verbosity(9), Level::TRACE);
    }
}
