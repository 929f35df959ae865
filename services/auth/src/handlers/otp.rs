use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::otp::{IssueOtpInput, IssueOtpUseCase};

#[derive(Deserialize)]
pub struct IssueOtpRequest {
    pub email: String,
}

pub async fn issue_otp(
    State(state): State<AppState>,
    Json(body): Json<IssueOtpRequest>,
) -> Result<StatusCode, AuthServiceError> {
    let usecase = IssueOtpUseCase {
        limiter: state.rate_limiter(),
        challenges: state.otp_challenge_repo(),
    };
    usecase.execute(IssueOtpInput { email: body.email }).await?;
    Ok(StatusCode::CREATED)
}
