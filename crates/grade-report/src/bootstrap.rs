use std::path::Path;

use grade_core::classifier::SubjectRules;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map Python-style level names to `tracing` filter directives.
///
/// Unknown names pass through lowercased so `EnvFilter` can judge them.
pub fn normalise_level(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber writing to stderr.
///
/// Falls back to `"warn"` if the level string is not a valid filter.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(normalise_level(log_level)).unwrap_or_else(|_| EnvFilter::new("warn"));

    let layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry().with(filter).with(layer).init();

    Ok(())
}

// ── Rules bootstrap ────────────────────────────────────────────────────────────

/// Write the built-in subject rules to `path`, creating parent directories.
pub fn write_default_rules(path: &Path) -> anyhow::Result<()> {
    SubjectRules::default().save_to(path)?;
    tracing::info!("Wrote default subject rules to {}", path.display());
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
