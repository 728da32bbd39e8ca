//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Output shape for emitted log events.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line; what deployments scrape.
    Json,
    /// Human-readable lines for local runs and tests.
    Plain,
}

/// Initialize tracing/logging for the process.
///
/// `RUST_LOG` overrides the default filter, which keeps workspace crates at
/// `info` and quiets everything else. Safe to call multiple times; subsequent
/// calls are no-ops.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,scoopstock=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Plain => builder.try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_a_no_op() {
        init(LogFormat::Plain);
        init(LogFormat::Json);
        tracing::info!("still alive after double init");
    }
}
