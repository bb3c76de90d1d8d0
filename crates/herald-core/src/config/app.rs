//! `[server]` section.

use serde::{Deserialize, Serialize};

/// Listener and shutdown settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How long to wait for background tasks after the listener stops.
    pub shutdown_grace_seconds: u64,
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            shutdown_grace_seconds: 30,
            cors: CorsConfig::default(),
        }
    }
}

/// `[server.cors]`. An origin of `"*"` allows any origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    /// Preflight cache lifetime.
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".into()],
            max_age_seconds: 3600,
        }
    }
}
