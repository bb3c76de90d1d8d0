//! `[logging]` section.

use serde::{Deserialize, Serialize};

/// Subscriber settings. `RUST_LOG` overrides `level` when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive, e.g. `info,herald_realtime=debug`.
    pub level: String,
    /// `json`, or anything else for human-readable output.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "json".into(),
        }
    }
}
