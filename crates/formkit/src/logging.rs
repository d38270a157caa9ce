#![forbid(unsafe_code)]

//! Subscriber setup for applications embedding formkit.
//!
//! The library crates only emit `tracing` events; nothing is printed until a
//! subscriber is installed. [`init`] installs a `fmt` subscriber filtered by
//! `FORMKIT_LOG` (an `EnvFilter` directive, default `warn`).
//!
//! # Environment variables
//!
//! - `FORMKIT_LOG`: filter directive, e.g. `formkit_runtime=debug`
//! - `FORMKIT_LOG_FORMAT`: `json` for JSON lines (needs the `json-logs`
//!   feature), anything else for the human-readable format

use std::env;
use std::fmt;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

pub const ENV_LOG: &str = "FORMKIT_LOG";
pub const ENV_LOG_FORMAT: &str = "FORMKIT_LOG_FORMAT";
pub const DEFAULT_FILTER: &str = "warn";

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive.
    pub filter: String,
    /// Emit JSON lines instead of the human-readable format.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    #[must_use]
    pub fn from_env() -> Self {
        from_env_with(|key| env::var(key).ok())
    }
}

fn from_env_with<F>(mut get: F) -> LoggingConfig
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = LoggingConfig::default();
    if let Some(filter) = get(ENV_LOG).filter(|f| !f.trim().is_empty()) {
        config.filter = filter;
    }
    if let Some(format) = get(ENV_LOG_FORMAT) {
        config.json = format.trim().eq_ignore_ascii_case("json");
    }
    config
}

#[derive(Debug)]
pub enum LoggingError {
    /// The filter directive did not parse.
    Filter(tracing_subscriber::filter::ParseError),
    /// A global subscriber is already installed.
    Init(TryInitError),
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter(err) => write!(f, "invalid log filter: {err}"),
            Self::Init(err) => write!(f, "logging init failed: {err}"),
        }
    }
}

impl std::error::Error for LoggingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Filter(err) => Some(err),
            Self::Init(err) => Some(err),
        }
    }
}

/// Install the global subscriber configured from the environment.
pub fn init() -> Result<(), LoggingError> {
    init_with(&LoggingConfig::from_env())
}

/// Install the global subscriber described by `config`.
pub fn init_with(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(&config.filter).map_err(LoggingError::Filter)?;
    let registry = tracing_subscriber::registry().with(filter);

    #[cfg(feature = "json-logs")]
    {
        if config.json {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .map_err(LoggingError::Init)?;
            tracing::debug!(filter = %config.filter, "json logging initialised");
            return Ok(());
        }
    }

    registry
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(LoggingError::Init)?;
    tracing::debug!(filter = %config.filter, "logging initialised");
    Ok(())
}
