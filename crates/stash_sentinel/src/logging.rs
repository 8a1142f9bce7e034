//! Logging system setup
//!
//! Installs the global tracing subscriber. `RUST_LOG` takes precedence over
//! the configured level when it is set.

use crate::config::LoggingSettings;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the global subscriber.
///
/// # Arguments
///
/// * `settings` - Level filter and output format. `RUST_LOG`, when set and
///   valid, replaces the level
///
/// # Returns
///
/// `Ok(())` once the subscriber is installed, or an error if a global
/// subscriber already exists.
pub fn setup_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let registry = tracing_subscriber::registry().with(filter);

    if settings.json_format {
        registry
            .with(fmt::layer().json().with_target(false))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_ansi(true).with_target(false))
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_setup_fails() {
        let settings = LoggingSettings {
            level: "debug".to_string(),
            json_format: false,
        };

        // Only one global subscriber can exist per process, so at most one
        // of these calls succeeds.
        let first = setup_logging(&settings);
        let second = setup_logging(&settings);
        assert!(first.is_err() || second.is_err());
    }
}
