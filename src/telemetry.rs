//! Tracing setup and standard spans.

use crate::config::LogConfig;
use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber.
///
/// `RUST_LOG` overrides the configured level. Calling this twice is a no-op
/// for the second call.
pub fn init_tracing(config: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }
}

/// Standardized span constructors for ban observability.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one expiry sweep.
    pub fn sweep(now: i64) -> Span {
        info_span!("sweep", now)
    }

    /// Span for a console command execution.
    pub fn console_command(name: &str, source: &str) -> Span {
        info_span!("console_command", name = %name, source = %source)
    }
}
