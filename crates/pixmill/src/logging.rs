//! Logging setup on top of `tracing-subscriber`.
//!
//! Logs go to stderr so stdout stays clean for `--events jsonl` and
//! `inspect --json` output. `RUST_LOG` overrides the configured level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber at `level`, as JSON or human-readable text.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Install logging from the `[logging]` config section.
///
/// `--verbose` raises the level to at least debug; `--json-logs` forces JSON.
pub fn init_from_config(
    config: &pixmill_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let configured = config.logging.level.as_str();
    let level = if verbose_override && !matches!(configured, "debug" | "trace") {
        "debug"
    } else {
        configured
    };
    let json_format = json_logs_override || config.logging.format == "json";
    init(level, json_format);
}
