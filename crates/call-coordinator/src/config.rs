//! Coordinator configuration
//!
//! # Usage Examples
//!
//! ```rust
//! use rvoip_call_coordinator::CoordinatorConfig;
//! use std::time::Duration;
//!
//! let config = CoordinatorConfig::new()
//!     .with_tick_interval(Duration::from_millis(500))
//!     .with_start_notice("Call started");
//!
//! assert_eq!(config.tick_interval(), Duration::from_millis(500));
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Loading from TOML
//!
//! ```rust
//! use rvoip_call_coordinator::CoordinatorConfig;
//!
//! let config = CoordinatorConfig::from_toml_str(r#"
//!     tick_interval_ms = 250
//!     terminated_notice = "Call ended"
//! "#).unwrap();
//!
//! assert_eq!(config.tick_interval_ms, 250);
//! assert_eq!(config.start_notice, "Start");
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoordinatorError, CoordinatorResult};

/// Default elapsed-time period
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Default capacity of the coordinator event broadcast channel
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

/// Configuration for a [`SessionCoordinator`](crate::SessionCoordinator)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Period of the elapsed-time ticker in milliseconds
    pub tick_interval_ms: u64,
    /// Capacity of the broadcast channel behind `subscribe()`
    ///
    /// Slow subscribers that fall further behind than this lose events.
    pub event_capacity: usize,
    /// Body of the system message appended on `Connected`
    pub start_notice: String,
    /// Body of the system message appended on termination
    pub terminated_notice: String,
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn with_start_notice(mut self, notice: impl Into<String>) -> Self {
        self.start_notice = notice.into();
        self
    }

    pub fn with_terminated_notice(mut self, notice: impl Into<String>) -> Self {
        self.terminated_notice = notice.into();
        self
    }

    /// Check the configuration for values the coordinator cannot run with
    pub fn validate(&self) -> CoordinatorResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(CoordinatorError::config("tick_interval_ms must be greater than zero"));
        }
        if self.event_capacity == 0 {
            return Err(CoordinatorError::config("event_capacity must be greater than zero"));
        }
        Ok(())
    }

    /// Parse and validate a TOML document; omitted keys take their defaults
    pub fn from_toml_str(source: &str) -> CoordinatorResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> CoordinatorResult<String> {
        Ok(toml::to_string(self)?)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            start_notice: "Start".to_string(),
            terminated_notice: "Terminated".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.event_capacity, 1000);
        assert_eq!(config.start_notice, "Start");
        assert_eq!(config.terminated_notice, "Terminated");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_round_trip_keeps_custom_values() {
        let config = CoordinatorConfig::new()
            .with_tick_interval(Duration::from_millis(250))
            .with_terminated_notice("Bye");
        let text = config.to_toml_string().unwrap();
        assert_eq!(CoordinatorConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let err = CoordinatorConfig::from_toml_str("tick_interval_ms = 0").unwrap_err();
        assert!(matches!(err, CoordinatorError::Configuration { .. }));
    }

    #[test]
    fn malformed_toml_is_a_configuration_error() {
        let err = CoordinatorConfig::from_toml_str("tick_interval_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, CoordinatorError::Configuration { .. }));
    }
}
