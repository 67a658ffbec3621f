//! PHI-aware logging for ClinicSync
//!
//! Clinic datasets are full of identifying values. Log lines produced while
//! reconciling them must still let an operator follow what happened without
//! exposing who it happened to.
//!
//! # Key Features
//!
//! - **Fingerprints**: [`fingerprint`] turns an identifying value (a patient
//!   content key embeds name and date of birth) into a short hash that is
//!   stable across runs, so duplicates can be correlated in logs
//! - **Free-text redaction**: [`redact`] masks emails, phone numbers, SSNs
//!   and ISO dates in messages coming back from external collaborators
//! - **Subscriber setup**: [`init_tracing`] installs an `EnvFilter` plus a
//!   pretty or JSON formatter
//!
//! # Example
//!
//! ```rust,ignore
//! use logger_redacted::{init_tracing, fingerprint, LoggerConfig};
//!
//! init_tracing(&LoggerConfig::default().json(true))?;
//! tracing::debug!(key = %fingerprint("alice|1990-01-01"), "Collapsed content duplicate");
//! ```

pub mod config;
pub mod redactor;

pub use config::*;
pub use redactor::*;

use thiserror::Error;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Logger initialization failed: {0}")]
    Init(String),
}

/// Install the global tracing subscriber, writing to stderr. `RUST_LOG`
/// overrides the configured filter.
///
/// # Errors
///
/// Fails when the filter cannot be parsed or a subscriber is already set.
pub fn init_tracing(config: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|err| LoggerError::InvalidFilter(err.to_string()))?,
    };

    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    result.map_err(|err| LoggerError::Init(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_rejected() {
        std::env::remove_var("RUST_LOG");
        let config = LoggerConfig {
            filter: "clinic_sync=loudest".to_string(),
            ..LoggerConfig::default()
        };
        assert!(matches!(init_tracing(&config), Err(LoggerError::InvalidFilter(_))));
    }
}
