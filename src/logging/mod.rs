//! Logging configuration and initialization
//!
//! Centralized setup for the `tracing` ecosystem. Benchmark progress is
//! logged to stderr so that the final report on stdout stays clean.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: standard tracing filter (e.g. "info", "debug,forgebench=trace")
//! - `FORGEBENCH_LOG_LEVEL`: simple log level (error, warn, info, debug, trace)
//! - `FORGEBENCH_LOG_FORMAT`: output format ("human" or "json")

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static TRACING_INITIALIZED: OnceCell<()> = OnceCell::new();

const LOG_LEVEL_ENV: &str = "FORGEBENCH_LOG_LEVEL";
const LOG_FORMAT_ENV: &str = "FORGEBENCH_LOG_FORMAT";
const DEFAULT_LEVEL: &str = "info";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON structured output
    Json,
}

impl LogFormat {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" | "pretty" | "console" => Some(LogFormat::Human),
            "json" | "structured" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Initialize logging from environment variables.
///
/// Idempotent - repeated calls only initialize the subscriber once.
pub fn init_from_env() {
    TRACING_INITIALIZED.get_or_init(|| {
        let format = std::env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|s| LogFormat::from_str(&s))
            .unwrap_or_default();
        init_with_format(format);
    });
}

/// Initialize logging with an explicit format, env-derived filter.
///
/// Idempotent like [`init_from_env`].
pub fn init(format: LogFormat) {
    TRACING_INITIALIZED.get_or_init(|| init_with_format(format));
}

fn init_with_format(format: LogFormat) {
    let filter = build_env_filter();
    match format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(false);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        LogFormat::Human => {
            let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }
}

/// `RUST_LOG` wins (standard tracing convention), then the crate-specific
/// level variable, then "info".
fn build_env_filter() -> EnvFilter {
    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        if let Ok(filter) = EnvFilter::try_new(rust_log) {
            return filter;
        }
    }
    if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
        if let Ok(filter) = EnvFilter::try_new(level) {
            return filter;
        }
    }
    EnvFilter::new(DEFAULT_LEVEL)
}

/// Check if tracing has been initialized
pub fn is_initialized() -> bool {
    TRACING_INITIALIZED.get().is_some()
}
