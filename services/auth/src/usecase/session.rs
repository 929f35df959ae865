use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use bookly_auth_types::cookie::SESSION_EXP;
use bookly_auth_types::token::SessionClaims;
use bookly_domain::destination::Destination;
use bookly_domain::email::Email;
use bookly_domain::otp::OtpCode;

use crate::domain::repository::{OtpChallengeRepository, UserRepository};
use crate::domain::types::AuthUser;
use crate::error::AuthServiceError;

fn now_secs() -> Result<u64, AuthServiceError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AuthServiceError::Internal(e.into()))?;
    Ok(elapsed.as_secs())
}

/// Sign a session token for `user_id`. Returns the token and its `exp`.
pub fn issue_session_token(user_id: Uuid, secret: &str) -> Result<(String, u64), AuthServiceError> {
    let exp = now_secs()? + SESSION_EXP;
    let claims = SessionClaims {
        sub: user_id.to_string(),
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthServiceError::Internal(e.into()))?;
    Ok((token, exp))
}

// ── CreateSession (redeem) ────────────────────────────────────────────────────

pub struct CreateSessionInput {
    pub email: String,
    pub code: String,
}

#[derive(Debug)]
pub struct CreateSessionOutput {
    pub user: AuthUser,
    pub token: String,
    pub session_exp: u64,
    pub destination: Destination,
}

pub struct CreateSessionUseCase<U: UserRepository, C: OtpChallengeRepository> {
    pub users: U,
    pub challenges: C,
    pub jwt_secret: String,
}

impl<U: UserRepository, C: OtpChallengeRepository> CreateSessionUseCase<U, C> {
    pub async fn execute(
        &self,
        input: CreateSessionInput,
    ) -> Result<CreateSessionOutput, AuthServiceError> {
        let email = Email::parse(&input.email).map_err(|_| AuthServiceError::InvalidOtp)?;
        let code = OtpCode::parse(&input.code).map_err(|_| AuthServiceError::InvalidOtp)?;

        let challenge = self
            .challenges
            .find_active(email.as_str())
            .await?
            .filter(|c| c.is_active(Utc::now()))
            .ok_or(AuthServiceError::InvalidOtp)?;

        let matches: bool = challenge
            .code
            .as_bytes()
            .ct_eq(code.as_str().as_bytes())
            .into();
        if !matches {
            return Err(AuthServiceError::InvalidOtp);
        }

        // Conditional update: a concurrent redemption or a newer issue wins.
        if !self.challenges.consume(challenge.id).await? {
            return Err(AuthServiceError::InvalidOtp);
        }

        let user = self.users.find_or_create_by_email(email.as_str()).await?;
        let (token, session_exp) = issue_session_token(user.id, &self.jwt_secret)?;
        let destination = user.destination();

        tracing::info!(user_id = %user.id, ?destination, "session created");
        Ok(CreateSessionOutput {
            user,
            token,
            session_exp,
            destination,
        })
    }
}

// ── GetSession ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct SessionView {
    pub user: AuthUser,
    pub destination: Destination,
    pub session_exp: u64,
}

pub struct GetSessionUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetSessionUseCase<U> {
    /// `user_id` and `session_exp` come from an already-validated cookie.
    pub async fn execute(
        &self,
        user_id: Uuid,
        session_exp: u64,
    ) -> Result<SessionView, AuthServiceError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::InvalidSession)?;
        let destination = user.destination();
        Ok(SessionView {
            user,
            destination,
            session_exp,
        })
    }
}
