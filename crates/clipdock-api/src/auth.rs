//! Caller identification.
//!
//! The service sits behind a gateway that authenticates users and forwards
//! the verified identity in the `x-user-id` header; this extractor only
//! requires the header to be present.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use clipdock_core::AppError;

use crate::error::HttpAppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity of the calling user.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(format!(
                    "Missing {} header",
                    USER_ID_HEADER
                )))
            })?;

        Ok(UserContext {
            user_id: user_id.to_string(),
        })
    }
}
