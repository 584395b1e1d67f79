use runguard_config::LoggingSettings;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Initialize the tracing system
///
/// The filter is `settings.filter`, which already carries any `RUNGUARD_LOG`
/// override applied while loading configuration. Events go to stderr
/// through a compact formatter.
pub fn init(
    settings: &LoggingSettings,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_new(&settings.filter)?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(settings.ansi)
        .compact()
        .with_target(false)
        .with_thread_names(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Create a span for one wrapped call
pub fn call_span(name: &str) -> Span {
    span!(Level::DEBUG, "call", name = %name)
}

/// Emit a structured event for a finished call
pub fn call_completed(label: &str, elapsed: Duration, success: bool) {
    if success {
        info!(label = %label, elapsed_ms = %elapsed.as_millis(), "call_completed");
    } else {
        warn!(label = %label, elapsed_ms = %elapsed.as_millis(), "call_failed");
    }
}

/// Emit a structured event for cache lookups
pub fn cache_event(key: &str, hit: bool) {
    if hit {
        debug!(key = %key, "cache_hit");
    } else {
        debug!(key = %key, "cache_miss");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runguard_core::constants::RUNGUARD_LOG_VAR;
    use serial_test::serial;

    #[test]
    fn test_invalid_filter_is_rejected() {
        let settings = LoggingSettings {
            filter: "runguard=loud".to_string(),
            ansi: false,
        };

        assert!(init(&settings).is_err());
    }

    #[test]
    #[serial]
    fn test_environment_is_not_consulted() {
        std::env::set_var(RUNGUARD_LOG_VAR, "debug");
        let settings = LoggingSettings {
            filter: "runguard=loud".to_string(),
            ansi: false,
        };

        let result = init(&settings);
        std::env::remove_var(RUNGUARD_LOG_VAR);

        assert!(result.is_err());
    }
}
