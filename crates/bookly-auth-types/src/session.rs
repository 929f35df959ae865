//! Session-cookie extractor.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum_extra::extract::cookie::CookieJar;
use http::StatusCode;
use http::request::Parts;
use uuid::Uuid;

use crate::cookie::BOOKLY_SESSION;
use crate::token::validate_session_token;

/// HMAC secret used to validate session tokens. Provide it from router state via [`FromRef`].
#[derive(Clone)]
pub struct SessionKey(pub Arc<str>);

impl SessionKey {
    pub fn new(secret: &str) -> Self {
        Self(Arc::from(secret))
    }
}

/// Signed-in user taken from the `bookly_session` cookie.
///
/// Returns 401 if the cookie is absent, expired, or fails validation.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub session_exp: u64,
}

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    SessionKey: FromRef<S>,
{
    type Rejection = StatusCode;

    // Extract synchronously and return a 'static future; see the axum-core 0.5 signature.
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let key = SessionKey::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let info = jar
            .get(BOOKLY_SESSION)
            .ok_or(StatusCode::UNAUTHORIZED)
            .and_then(|cookie| {
                validate_session_token(cookie.value(), &key.0).map_err(|e| {
                    tracing::debug!(error = %e, "rejected session cookie");
                    StatusCode::UNAUTHORIZED
                })
            });

        async move {
            let info = info?;
            Ok(Self {
                user_id: info.user_id,
                session_exp: info.session_exp,
            })
        }
    }
}
