//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::alerts::{
    DEFAULT_ALERT_THRESHOLD_SECS, DEFAULT_POLL_INTERVAL_MS, MAX_ALERT_THRESHOLD_SECS,
};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Scheduler poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Alert window before expiry in seconds
    pub alert_threshold_secs: u64,
    /// JSON snapshot of the task store, None keeps tasks in memory only
    pub data_file: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8888)
    /// - `POLL_INTERVAL_MS` - Scheduler poll interval (default: 100)
    /// - `ALERT_THRESHOLD_SECS` - Alert window before expiry (default: 900,
    ///   values above 366 days fall back to the default)
    /// - `TASK_DATA_FILE` - Task snapshot path (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            poll_interval_ms: parse_var::<u64>("POLL_INTERVAL_MS")
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.poll_interval_ms),
            alert_threshold_secs: parse_var::<u64>("ALERT_THRESHOLD_SECS")
                .filter(|secs| *secs <= MAX_ALERT_THRESHOLD_SECS)
                .unwrap_or(defaults.alert_threshold_secs),
            data_file: env::var_os("TASK_DATA_FILE")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Alert window as a chrono duration, capped at 366 days.
    pub fn alert_threshold(&self) -> chrono::Duration {
        let secs = self.alert_threshold_secs.min(MAX_ALERT_THRESHOLD_SECS);
        chrono::Duration::seconds(secs as i64)
    }

    /// Poll interval as a std duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8888,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            alert_threshold_secs: DEFAULT_ALERT_THRESHOLD_SECS,
            data_file: None,
        }
    }
}
