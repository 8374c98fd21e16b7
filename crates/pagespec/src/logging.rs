//! Subscriber installation.
//!
//! The library crates only emit `tracing` events. Binaries and tools call
//! [`init`] once to route them to stderr, filtered by `PAGESPEC_LOG`
//! (`EnvFilter` directive syntax, default `info`).
//!
//! ```ignore
//! pagespec::logging::init()?;
//! ```
//!
//! [`init`] never replaces a subscriber the host application already set.

use std::env;
use std::fmt;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter variable.
pub const ENV_LOG: &str = "PAGESPEC_LOG";

/// Directives used when `PAGESPEC_LOG` is unset or blank.
pub const DEFAULT_DIRECTIVES: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    /// A global tracing subscriber is already installed.
    SubscriberAlreadySet,
    /// `PAGESPEC_LOG` is not a valid filter.
    InvalidFilter { directives: String, reason: String },
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscriberAlreadySet => {
                write!(f, "a global tracing subscriber is already set")
            }
            Self::InvalidFilter { directives, reason } => {
                write!(f, "invalid {ENV_LOG}={directives}: {reason}")
            }
        }
    }
}

impl std::error::Error for LoggingError {}

/// Build the filter from `PAGESPEC_LOG`.
pub fn filter_from_env() -> Result<EnvFilter, LoggingError> {
    filter_from(env::var(ENV_LOG).ok().as_deref())
}

fn filter_from(raw: Option<&str>) -> Result<EnvFilter, LoggingError> {
    let directives = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVES);
    EnvFilter::try_new(directives).map_err(|err| LoggingError::InvalidFilter {
        directives: directives.to_owned(),
        reason: err.to_string(),
    })
}

/// Install a stderr fmt subscriber filtered by `PAGESPEC_LOG`.
pub fn init() -> Result<(), LoggingError> {
    let filter = filter_from_env()?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)?;
    tracing::debug!(target: "pagespec", "logging initialized");
    Ok(())
}
