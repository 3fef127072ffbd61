//! Gate configuration.

use crate::error::{Error, Result};
use std::time::Duration;

/// Default poll interval. The poll is a liveness bound, not the primary
/// propagation channel, so it is deliberately coarse.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Environment variable overriding the poll interval, in milliseconds.
pub const POLL_INTERVAL_ENV: &str = "VEIL_POLL_INTERVAL_MS";

/// Configuration shared by gate controllers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Upper bound on how long a missed notification can delay convergence.
    pub poll_interval: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl GateConfig {
    pub fn with_poll_interval(poll_interval: Duration) -> Result<Self> {
        if poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be non-zero".into()));
        }
        Ok(Self { poll_interval })
    }

    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var(POLL_INTERVAL_ENV) {
            Ok(raw) => Self::parse_poll_interval(&raw),
            Err(_) => Ok(Self::default()),
        }
    }

    fn parse_poll_interval(raw: &str) -> Result<Self> {
        let millis: u64 = raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("invalid {}: {:?}", POLL_INTERVAL_ENV, raw)))?;
        Self::with_poll_interval(Duration::from_millis(millis))
    }
}
