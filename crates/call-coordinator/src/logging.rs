//! Logging setup for applications embedding the coordinator
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the owning application, which can use [`setup_logging`].
//!
//! ```rust,no_run
//! use rvoip_call_coordinator::logging::{parse_log_level, setup_logging, LoggingConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let level = parse_log_level("debug")?;
//! setup_logging(LoggingConfig::new(level, "call-screen").with_spans())?;
//! # Ok(())
//! # }
//! ```

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{CoordinatorError, CoordinatorResult};

/// How the embedding application wants coordinator logs rendered
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Baseline verbosity; `RUST_LOG` directives are layered on top
    pub level: Level,
    /// Emit one JSON object per event instead of the human format
    pub json: bool,
    /// Prefix events with their source file and line
    pub file_info: bool,
    /// Record when `session_coordinator` spans open and close
    pub log_spans: bool,
    /// Name announced by the startup line
    pub app_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: Level::INFO,
            json: false,
            file_info: false,
            log_spans: false,
            app_name: "rvoip-call-coordinator".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn new(level: Level, app_name: impl Into<String>) -> Self {
        LoggingConfig {
            level,
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    pub fn with_spans(mut self) -> Self {
        self.log_spans = true;
        self
    }

    fn span_events(&self) -> FmtSpan {
        if self.log_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::from_default_env().add_directive(LevelFilter::from_level(self.level).into())
    }
}

/// Install the process-wide fmt subscriber described by `config`
///
/// Only one subscriber can exist per process; a second call returns
/// [`CoordinatorError::Logging`] instead of panicking.
pub fn setup_logging(config: LoggingConfig) -> CoordinatorResult<()> {
    let mut subscriber = fmt::Subscriber::builder()
        .with_env_filter(config.env_filter())
        .with_span_events(config.span_events());

    if config.file_info {
        subscriber = subscriber.with_file(true).with_line_number(true);
    }

    let installed = if config.json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    installed.map_err(|e| CoordinatorError::logging(e.to_string()))?;

    log_welcome(&config.app_name, crate::VERSION);
    Ok(())
}

/// Level from a name such as `"debug"` or `"WARN"`, for CLI flags and config files
pub fn parse_log_level(level: &str) -> CoordinatorResult<Level> {
    Level::from_str(level)
        .map_err(|_| CoordinatorError::config(format!("Invalid log level: {}", level)))
}

/// Startup line naming the application and the coordinator version
pub fn log_welcome(app_name: &str, version: &str) {
    tracing::info!("{} running call coordinator v{}", app_name, version);
}
