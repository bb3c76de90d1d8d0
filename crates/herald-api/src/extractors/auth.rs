//! `AuthUser` extractor: bearer credential from the Authorization header.

use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use herald_core::error::AppError;
use herald_realtime::connection::AuthenticatedUser;

use crate::error::ApiError;
use crate::state::AppState;

/// The caller of a REST request, verified the same way as a live handshake.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedUser);

impl std::ops::Deref for AuthUser {
    type Target = AuthenticatedUser;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::authentication("Missing or invalid Authorization header"))?;

        let user = state
            .realtime
            .handshake()
            .authenticate(bearer.token())
            .await?;

        Ok(AuthUser(user))
    }
}
