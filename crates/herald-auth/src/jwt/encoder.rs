//! Access token issuing.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header};

use herald_core::config::AuthConfig;
use herald_core::error::{AppError, ErrorKind};
use herald_core::types::id::UserId;

use super::claims::Claims;

/// Signs HS256 access tokens. Used by the host application and by tests.
#[derive(Clone)]
pub struct JwtEncoder {
    key: EncodingKey,
    ttl: Duration,
}

impl fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtEncoder").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl JwtEncoder {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: ttl_from_minutes(config.jwt_access_ttl_minutes),
        }
    }

    /// Issue a token for `user_id`, returning it with its expiry.
    pub fn generate_access_token(
        &self,
        user_id: UserId,
        username: &str,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let claims = Claims::issue(user_id, username, self.ttl);
        let expires_at = claims.expires_at();
        Ok((self.encode(&claims)?, expires_at))
    }

    /// Sign `claims` as they are, including already-expired ones.
    pub fn encode(&self, claims: &Claims) -> Result<String, AppError> {
        jsonwebtoken::encode(&Header::default(), claims, &self.key)
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Could not sign access token", e))
    }
}

/// Absurdly large TTLs are capped at a century.
fn ttl_from_minutes(minutes: u64) -> Duration {
    let century = Duration::days(36_500);
    i64::try_from(minutes)
        .ok()
        .and_then(Duration::try_minutes)
        .map_or(century, |ttl| ttl.min(century))
}
