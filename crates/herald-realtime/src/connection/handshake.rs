//! Bearer handshake for live connections.

use std::sync::Arc;

use tracing::{debug, warn};

use herald_auth::JwtDecoder;
use herald_core::error::AppError;
use herald_core::types::id::UserId;
use herald_database::ContentLookup;

/// An identity resolved from a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The user id.
    pub user_id: UserId,
    /// The user's current username.
    pub username: String,
}

/// Verifies a credential and confirms the user still exists.
#[derive(Clone)]
pub struct SessionHandshake {
    decoder: JwtDecoder,
    content: Arc<dyn ContentLookup>,
}

impl std::fmt::Debug for SessionHandshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandshake")
            .field("decoder", &self.decoder)
            .finish()
    }
}

impl SessionHandshake {
    /// Creates a new handshake.
    pub fn new(decoder: JwtDecoder, content: Arc<dyn ContentLookup>) -> Self {
        Self { decoder, content }
    }

    /// Resolves a credential to a live user.
    ///
    /// Signature, expiry, and a lookup failure all surface as authentication
    /// errors; store failures keep their own kind.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let claims = self.decoder.decode_access_token(token)?;

        let user = self.content.get_user(claims.user_id()).await?.ok_or_else(|| {
            warn!(user_id = %claims.sub, "Credential for unknown user");
            AppError::authentication("User no longer exists")
        })?;

        debug!(user_id = %user.id, "Handshake authenticated");
        Ok(AuthenticatedUser {
            user_id: user.id,
            username: user.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use herald_auth::JwtEncoder;
    use herald_core::config::AuthConfig;
    use herald_database::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_known_user_is_authenticated() {
        let config = AuthConfig::default();
        let store = Arc::new(MemoryStore::new());
        let user = store.insert_user("alice", Some("Alice")).await;
        let (token, _) = JwtEncoder::new(&config)
            .generate_access_token(user, "alice")
            .unwrap();

        let handshake = SessionHandshake::new(JwtDecoder::new(&config), store);
        let authed = handshake.authenticate(&token).await.unwrap();
        assert_eq!(authed.user_id, user);
        assert_eq!(authed.username, "alice");
    }

    #[tokio::test]
    async fn test_deleted_user_is_rejected() {
        let config = AuthConfig::default();
        let store = Arc::new(MemoryStore::new());
        let (token, _) = JwtEncoder::new(&config)
            .generate_access_token(UserId::new(), "ghost")
            .unwrap();

        let handshake = SessionHandshake::new(JwtDecoder::new(&config), store);
        let err = handshake.authenticate(&token).await.unwrap_err();
        assert!(err.is_authentication());
    }

    #[tokio::test]
    async fn test_bad_token_is_rejected() {
        let config = AuthConfig::default();
        let handshake =
            SessionHandshake::new(JwtDecoder::new(&config), Arc::new(MemoryStore::new()));
        assert!(handshake.authenticate("garbage").await.unwrap_err().is_authentication());
    }
}
