//! AuthUser extractor for Axum handlers.
//!
//! Reads the identity that the `require_auth` middleware placed in request
//! extensions.

use crate::api::handlers::{AppError, TrackerState};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

/// Authenticated user identity, taken from a verified token's subject.
///
/// ```rust,ignore
/// async fn my_handler(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.user_id)
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl FromRequestParts<TrackerState> for AuthUser {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &TrackerState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async {
            parts
                .extensions
                .get::<AuthUser>()
                .copied()
                .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::test_state;
    use axum::http::Request;

    #[tokio::test]
    async fn test_extracts_from_extensions() {
        let user_id = Uuid::new_v4();
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(AuthUser { user_id });

        let user = AuthUser::from_request_parts(&mut parts, &test_state())
            .await
            .unwrap();
        assert_eq!(user.user_id, user_id);
    }

    #[tokio::test]
    async fn test_missing_extension_is_rejected() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let result = AuthUser::from_request_parts(&mut parts, &test_state()).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
