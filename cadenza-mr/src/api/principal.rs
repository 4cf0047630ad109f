//! Authenticated principal extraction
//!
//! Authentication itself lives in the upstream gateway, which verifies the
//! caller and installs `x-user-id` on the proxied request. This extractor
//! only reads that header; history operations must use it, never a
//! client-supplied id.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

/// Header installed by the auth gateway
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller
#[derive(Debug, Clone, Copy)]
pub struct Principal {
    pub user_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized(format!("Missing {} header", USER_ID_HEADER)))?;

        let user_id = Uuid::parse_str(raw)
            .map_err(|_| ApiError::Unauthorized(format!("Malformed {} header", USER_ID_HEADER)))?;

        Ok(Principal { user_id })
    }
}
