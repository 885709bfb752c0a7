/// Structured logging for the river data service
///
/// Thin layer over `tracing`: every event carries the data source and,
/// where relevant, the USGS site number, so a run's log can be filtered
/// per gauge. Console output goes to stderr; an optional log file receives
/// the same events without ANSI colouring.

use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt};

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Usgs,
    Storage,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Usgs => write!(f, "USGS"),
            DataSource::Storage => write!(f, "STORE"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - gauge offline, seasonal, or no recent data
    Expected,
    /// Unexpected failure - indicates service degradation or configuration issue
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Subscriber setup
// ---------------------------------------------------------------------------

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `default_level` when set. Calling this twice is
/// harmless; the second subscriber is discarded.
pub fn init(default_level: &str, log_file: Option<&Path>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let console_layer = tracing_fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Log a general informational message
pub fn info(source: DataSource, site_id: Option<&str>, message: &str) {
    tracing::info!(source = %source, site = site_id.unwrap_or("-"), "{}", message);
}

/// Log a warning message
pub fn warn(source: DataSource, site_id: Option<&str>, message: &str) {
    tracing::warn!(source = %source, site = site_id.unwrap_or("-"), "{}", message);
}

/// Log an error message
pub fn error(source: DataSource, site_id: Option<&str>, message: &str) {
    tracing::error!(source = %source, site = site_id.unwrap_or("-"), "{}", message);
}

/// Log a debug message
pub fn debug(source: DataSource, site_id: Option<&str>, message: &str) {
    tracing::debug!(source = %source, site = site_id.unwrap_or("-"), "{}", message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a USGS site failure based on the error message.
pub fn classify_usgs_failure(error_message: &str) -> FailureType {
    if error_message.contains("No data") {
        // Gauges drop out intermittently; an empty document is routine.
        FailureType::Expected
    } else if error_message.contains("HTTP error") || error_message.contains("Transport error") {
        FailureType::Unexpected
    } else if error_message.contains("Parse error") {
        // RDB layout changes or garbage rows
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

/// Log a USGS site failure with automatic classification
pub fn log_usgs_failure(site_no: &str, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_usgs_failure(&error_msg);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => info(DataSource::Usgs, Some(site_no), &message),
        FailureType::Unexpected => error(DataSource::Usgs, Some(site_no), &message),
        FailureType::Unknown => warn(DataSource::Usgs, Some(site_no), &message),
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one pipeline run
pub fn log_run_summary(total: usize, processed: usize, skipped: usize) {
    let message = format!(
        "Run complete: {}/{} sites processed, {} skipped",
        processed, total, skipped
    );

    if skipped == 0 {
        info(DataSource::Usgs, None, &message);
    } else if processed == 0 {
        error(DataSource::Usgs, None, &message);
    } else {
        warn(DataSource::Usgs, None, &message);
    }
}
