//! Configuration management for the host.

use std::env;
use std::time::Duration;

/// Host configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store instance the document source talks to
    pub project_id: String,
    /// Simulated latency of point reads and queries
    pub fetch_latency: Duration,
    /// Simulated latency of pushed snapshots
    pub push_latency: Duration,
    /// Upper bound for a single `Host::wait_for_update`
    pub update_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: "demo-project".to_string(),
            fetch_latency: Duration::from_millis(5),
            push_latency: Duration::ZERO,
            update_timeout: Duration::from_millis(1000),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let project_id = env::var("PROJECT_ID").unwrap_or(defaults.project_id);

        let fetch_latency = parse_millis(env::var("FETCH_LATENCY_MS").ok(), defaults.fetch_latency)
            .ok_or(ConfigError::InvalidLatency("FETCH_LATENCY_MS"))?;

        let push_latency = parse_millis(env::var("PUSH_LATENCY_MS").ok(), defaults.push_latency)
            .ok_or(ConfigError::InvalidLatency("PUSH_LATENCY_MS"))?;

        let update_timeout =
            parse_millis(env::var("UPDATE_TIMEOUT_MS").ok(), defaults.update_timeout)
                .filter(|timeout| !timeout.is_zero())
                .ok_or(ConfigError::InvalidTimeout)?;

        Ok(Self {
            project_id,
            fetch_latency,
            push_latency,
            update_timeout,
        })
    }
}

/// `None` when the variable is set but not a whole number of milliseconds.
fn parse_millis(raw: Option<String>, default: Duration) -> Option<Duration> {
    match raw {
        None => Some(default),
        Some(raw) => raw.trim().parse().ok().map(Duration::from_millis),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {0} value")]
    InvalidLatency(&'static str),

    #[error("UPDATE_TIMEOUT_MS must be a positive number of milliseconds")]
    InvalidTimeout,
}
