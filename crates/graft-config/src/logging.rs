//! Centralized logging initialization with environment variable support

use crate::{AppConfig, LogFormat};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Environment variables (in priority order):
/// - `RUST_LOG`: Standard Rust log filter (takes precedence over all)
/// - `LOG_FORMAT`: Override format (json, pretty)
///
/// # Examples
///
/// ```bash
/// # See every edit decision the engine makes
/// RUST_LOG=graft_ast=debug graft register-service ...
///
/// # Machine-readable logs
/// LOG_FORMAT=json graft synth ...
/// ```
pub fn initialize(config: &AppConfig) {
    let log_level = config.logging.level.parse().unwrap_or(tracing::Level::WARN);

    // RUST_LOG directives win over the configured level
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|f| match f.to_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" | "human" => Some(LogFormat::Pretty),
            _ => None,
        })
        .unwrap_or_else(|| config.logging.format.clone());

    // Always write to stderr: stdout carries generated source in dry-run mode
    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
    };

    if let Err(err) = result {
        // A subscriber installed by a test harness or embedding tool stays in charge
        tracing::debug!(error = %err, "Tracing subscriber already initialized");
    }
}

/// Span covering every log line emitted while patching one file
pub fn file_span(path: &std::path::Path, operation: &str) -> tracing::Span {
    tracing::info_span!(
        "patch",
        path = %path.display(),
        operation = %operation
    )
}
