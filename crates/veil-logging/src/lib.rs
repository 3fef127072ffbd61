//! Tracing setup shared by veil binaries.
//!
//! `RUST_LOG` wins when set; otherwise the caller's default directives
//! apply.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directives used when neither `RUST_LOG` nor the caller supplies any.
pub const DEFAULT_DIRECTIVES: &str = "veil=info";

/// Build the filter from an optional `RUST_LOG` value and default directives.
pub fn filter(env: Option<&str>, default: &str) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(default: &str) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let result = tracing_subscriber::registry()
        .with(filter(env.as_deref(), default))
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_ok() {
        tracing::debug!("tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_applies_without_env() {
        let filter = filter(None, "veil=debug");
        assert!(filter.to_string().contains("veil=debug"));
    }

    #[test]
    fn env_overrides_default() {
        let filter = filter(Some("veil_gate=trace"), DEFAULT_DIRECTIVES);
        assert!(filter.to_string().contains("veil_gate=trace"));
    }

    #[test]
    fn invalid_env_falls_back() {
        let filter = filter(Some("veil=notalevel"), "veil=warn");
        assert!(filter.to_string().contains("veil=warn"));
    }

    #[test]
    fn init_twice_is_harmless() {
        init(DEFAULT_DIRECTIVES);
        init(DEFAULT_DIRECTIVES);
    }
}
