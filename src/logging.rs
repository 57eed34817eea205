/*!
 * Logging and tracing initialization
 */

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::AutomationConfig;
use crate::error::{AutomationError, Result};

/// Initialize structured logging based on configuration
///
/// `RUST_LOG` takes precedence; otherwise the configured level applies to this crate.
pub fn init_logging(config: &AutomationConfig) -> Result<()> {
    let env_filter = build_filter(config)?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AutomationError::Config(format!("Failed to install subscriber: {}", e)))
}

fn build_filter(config: &AutomationConfig) -> Result<EnvFilter> {
    let log_level = config.log_level.to_tracing_level();

    EnvFilter::try_from_default_env()
        .or_else(|_| {
            EnvFilter::try_new(format!(
                "psbridge={level},psbridge_dispatch={level}",
                level = log_level
            ))
        })
        .map_err(|e| AutomationError::Config(format!("Failed to create log filter: {}", e)))
}

/// Initialize logging with custom format for testing
#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("psbridge=debug"));

        let fmt_layer = fmt::layer().with_test_writer().with_target(false).compact();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .ok(); // Ignore error if already initialized
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_build_filter_for_each_level() {
        for level in [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ] {
            let config = AutomationConfig {
                log_level: level,
                ..Default::default()
            };
            assert!(build_filter(&config).is_ok());
        }
    }

    #[test]
    fn test_second_init_reports_error() {
        init_test_logging();

        // A global subscriber is already installed by now
        let result = init_logging(&AutomationConfig::default());
        assert!(matches!(result, Err(AutomationError::Config(_))));
    }
}
