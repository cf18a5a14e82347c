//! Tracing subscriber setup

use crate::config::LoggingConfig;
use crate::error::{ChangeError, Result};
use tracing::Level;

/// Parse a configured level name; unknown names fall back to `info`
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install a global fmt subscriber writing to stderr
///
/// Fails with [`ChangeError::Config`] if a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::fmt;

    fmt()
        .with_max_level(parse_level(&config.level))
        .with_target(config.verbose)
        .with_thread_ids(config.verbose)
        .with_file(config.verbose)
        .with_line_number(config.verbose)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| ChangeError::config(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("error"), Level::ERROR);
        assert_eq!(parse_level("chatty"), Level::INFO);
    }

    #[test]
    fn test_second_init_is_reported() {
        let config = LoggingConfig::default();
        // another test may have installed the subscriber already
        let _ = init_logging(&config);
        assert!(matches!(
            init_logging(&config),
            Err(ChangeError::Config(_))
        ));
    }
}
