//! Caller identity.
//!
//! Authentication happens upstream of this service; the gateway forwards the
//! authenticated user's id in the `x-user-id` header. Handlers take an
//! [`ActorId`] and pass it to the core, which authorizes by id equality.

use axum::{extract::FromRequestParts, http::request::Parts};
use gcoin_shared::AppError;
use gcoin_shared::types::UserId;

use crate::error::ApiError;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorId(pub UserId);

impl ActorId {
    /// Returns the caller's user id.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.0
    }
}

impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Err(AppError::Unauthorized(format!("{USER_ID_HEADER} header is required")).into());
        };

        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<UserId>().ok())
            .map(ActorId)
            .ok_or_else(|| {
                AppError::Unauthorized(format!("{USER_ID_HEADER} must be a UUID")).into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;

    async fn extract(header: Option<&str>) -> Result<ActorId, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        ActorId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_header_extracts_user() {
        let user_id = UserId::new();
        let actor = extract(Some(&user_id.to_string())).await.unwrap();
        assert_eq!(actor.user_id(), user_id);
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_is_unauthorized() {
        for header in [None, Some("not-a-uuid")] {
            let err = extract(header).await.unwrap_err();
            assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }
}
