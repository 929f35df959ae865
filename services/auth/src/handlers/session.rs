use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookly_auth_types::cookie::{clear_session_cookie, set_session_cookie};
use bookly_auth_types::session::SessionUser;
use bookly_core::serde::unix_secs_to_rfc3339_ms;
use bookly_domain::destination::Destination;

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::session::{CreateSessionInput, CreateSessionUseCase, GetSessionUseCase};

// ── POST /auth/session ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub email: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub redirect: Destination,
    #[serde(serialize_with = "unix_secs_to_rfc3339_ms")]
    pub expires_at: u64,
}

pub async fn create_session(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = CreateSessionUseCase {
        users: state.user_repo(),
        challenges: state.otp_challenge_repo(),
        jwt_secret: state.jwt_secret.clone(),
    };

    let out = usecase
        .execute(CreateSessionInput {
            email: body.email,
            code: body.code,
        })
        .await?;

    let jar = set_session_cookie(jar, out.token, &state.cookies);
    let body = CreateSessionResponse {
        redirect: out.destination,
        expires_at: out.session_exp,
    };
    Ok((StatusCode::CREATED, jar, Json(body)))
}

// ── GET /auth/session ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub email: String,
    pub onboarded: bool,
    pub redirect: Destination,
    #[serde(serialize_with = "unix_secs_to_rfc3339_ms")]
    pub expires_at: u64,
}

pub async fn get_session(
    State(state): State<AppState>,
    session: Result<SessionUser, StatusCode>,
) -> Result<Json<SessionResponse>, AuthServiceError> {
    let session = session.map_err(|_| AuthServiceError::InvalidSession)?;

    let usecase = GetSessionUseCase {
        users: state.user_repo(),
    };
    let view = usecase
        .execute(session.user_id, session.session_exp)
        .await?;

    Ok(Json(SessionResponse {
        user_id: view.user.id,
        onboarded: view.user.is_onboarded(),
        email: view.user.email,
        redirect: view.destination,
        expires_at: view.session_exp,
    }))
}

// ── DELETE /auth/session ──────────────────────────────────────────────────────

pub async fn delete_session(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = clear_session_cookie(jar, &state.cookies);
    (StatusCode::NO_CONTENT, jar)
}
