//! `[auth]` section.

use serde::{Deserialize, Serialize};

/// Bearer credential settings shared by the live endpoint and the REST routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret.
    pub jwt_secret: String,
    pub jwt_access_ttl_minutes: u64,
    /// Clock skew tolerated when checking `exp`.
    pub jwt_leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "CHANGE_ME_IN_PRODUCTION".into(),
            jwt_access_ttl_minutes: 60,
            jwt_leeway_seconds: 5,
        }
    }
}
