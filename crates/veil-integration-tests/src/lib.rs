//! Shared fixtures for the scenario tests under `tests/`.

use std::time::Duration;
use veil_core::{GateConfig, ScopeCatalog};

/// Global secret of [`site_catalog`].
pub const SITE_SECRET: &str = "open sesame";

/// Secret of the isolated `iq-plugin` scope.
pub const IQ_SECRET: &str = "iq";

/// Poll interval used by scenario tests.
pub const POLL: Duration = Duration::from_millis(1500);

/// A small site: two shared case studies and one isolated plugin page.
pub fn site_catalog() -> ScopeCatalog {
    ScopeCatalog::from_json(
        r#"{
            "global_secret": "open sesame",
            "scopes": [
                { "id": "nimbus" },
                { "id": "atlas" },
                { "id": "iq-plugin", "isolated": true, "secret": "iq", "prompt": "IQ password" }
            ]
        }"#,
    )
    .expect("fixture catalog parses")
}

pub fn config() -> GateConfig {
    GateConfig {
        poll_interval: POLL,
    }
}

/// A config whose poll never fires during a test.
pub fn no_poll() -> GateConfig {
    GateConfig {
        poll_interval: Duration::from_secs(24 * 3600),
    }
}

/// Let spawned gate tasks drain their pending signals.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
