//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use herald_core::config::AuthConfig;
use herald_core::error::AppError;

use super::claims::Claims;

/// Validates access tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.jwt_leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    ///
    /// Every failure maps to an authentication error; callers never see
    /// which check rejected the token beyond the message.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                debug!(error = %e, "Rejected access token");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    _ => AppError::authentication(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use herald_core::types::id::UserId;

    use super::*;
    use crate::jwt::JwtEncoder;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_issued_token_decodes_to_same_user() {
        let cfg = config("test-secret");
        let user = UserId::new();
        let (token, _) = JwtEncoder::new(&cfg)
            .generate_access_token(user, "alice")
            .unwrap();

        let claims = JwtDecoder::new(&cfg).decode_access_token(&token).unwrap();
        assert_eq!(claims.user_id(), user);
        assert_eq!(claims.username, "alice");
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let (token, _) = JwtEncoder::new(&config("one"))
            .generate_access_token(UserId::new(), "alice")
            .unwrap();

        let err = JwtDecoder::new(&config("two"))
            .decode_access_token(&token)
            .unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let cfg = config("test-secret");
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: UserId::new(),
            username: "alice".to_string(),
            iat: now - 7200,
            exp: now - 3600,
            jti: Uuid::new_v4(),
        };
        let token = JwtEncoder::new(&cfg).encode(&claims).unwrap();

        let err = JwtDecoder::new(&cfg).decode_access_token(&token).unwrap_err();
        assert!(err.is_authentication());
        assert_eq!(err.message, "Token has expired");
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = JwtDecoder::new(&config("s"))
            .decode_access_token("not-a-jwt")
            .unwrap_err();
        assert!(err.is_authentication());
    }
}
