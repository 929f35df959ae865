use chrono::Utc;

use bookly_auth::domain::types::{OTP_ISSUED, OtpIssuedPayload};
use bookly_auth::error::AuthServiceError;
use bookly_auth::usecase::otp::{IssueOtpInput, IssueOtpUseCase};

use crate::helpers::{MockOtpChallengeRepo, MockRateLimiter};

fn input(email: &str) -> IssueOtpInput {
    IssueOtpInput {
        email: email.to_owned(),
    }
}

#[tokio::test]
async fn should_issue_code_with_outbox_event() {
    let repo = MockOtpChallengeRepo::empty();
    let challenges = repo.challenges_handle();
    let events = repo.events_handle();

    let uc = IssueOtpUseCase {
        limiter: MockRateLimiter::unlimited(),
        challenges: repo,
    };
    uc.execute(input("reader@bookly.test")).await.unwrap();

    let challenges = challenges.lock().unwrap();
    assert_eq!(challenges.len(), 1, "expected exactly one challenge");
    let challenge = &challenges[0];
    assert_eq!(challenge.email, "reader@bookly.test");
    assert_eq!(challenge.code.len(), 6);
    assert!(challenge.code.bytes().all(|b| b.is_ascii_digit()));
    assert!(challenge.is_active(Utc::now()));
    let ttl = challenge.expires_at - challenge.created_at;
    assert_eq!(ttl.num_seconds(), 600);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1, "expected exactly one outbox event");
    let event = &events[0];
    assert_eq!(event.kind, OTP_ISSUED);
    assert_eq!(event.idempotency_key, format!("otp_issued:{}", challenge.id));
    let payload: OtpIssuedPayload = serde_json::from_value(event.payload.clone()).unwrap();
    assert_eq!(payload.email, challenge.email);
    assert_eq!(payload.code, challenge.code);
}

#[tokio::test]
async fn should_normalise_email_before_storing() {
    let repo = MockOtpChallengeRepo::empty();
    let challenges = repo.challenges_handle();

    let uc = IssueOtpUseCase {
        limiter: MockRateLimiter::unlimited(),
        challenges: repo,
    };
    uc.execute(input("  Reader@Bookly.TEST ")).await.unwrap();

    assert_eq!(challenges.lock().unwrap()[0].email, "reader@bookly.test");
}

#[tokio::test]
async fn should_return_invalid_email_for_malformed_address() {
    let repo = MockOtpChallengeRepo::empty();
    let challenges = repo.challenges_handle();

    let uc = IssueOtpUseCase {
        limiter: MockRateLimiter::unlimited(),
        challenges: repo,
    };
    let result = uc.execute(input("not-an-email")).await;

    assert!(
        matches!(result, Err(AuthServiceError::InvalidEmail)),
        "expected InvalidEmail, got {result:?}"
    );
    assert!(challenges.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_revoke_previous_challenge_on_reissue() {
    let repo = MockOtpChallengeRepo::empty();
    let challenges = repo.challenges_handle();

    let uc = IssueOtpUseCase {
        limiter: MockRateLimiter::unlimited(),
        challenges: repo,
    };
    uc.execute(input("reader@bookly.test")).await.unwrap();
    uc.execute(input("reader@bookly.test")).await.unwrap();

    let challenges = challenges.lock().unwrap();
    assert_eq!(challenges.len(), 2);
    let now = Utc::now();
    assert!(challenges[0].revoked_at.is_some(), "first code superseded");
    assert!(!challenges[0].is_active(now));
    assert!(challenges[1].is_active(now));
    assert_eq!(
        challenges.iter().filter(|c| c.is_active(now)).count(),
        1,
        "at most one active challenge per email"
    );
}

#[tokio::test]
async fn should_leave_other_emails_untouched_on_reissue() {
    let repo = MockOtpChallengeRepo::empty();
    let challenges = repo.challenges_handle();

    let uc = IssueOtpUseCase {
        limiter: MockRateLimiter::unlimited(),
        challenges: repo,
    };
    uc.execute(input("a@bookly.test")).await.unwrap();
    uc.execute(input("b@bookly.test")).await.unwrap();

    let now = Utc::now();
    assert!(challenges.lock().unwrap().iter().all(|c| c.is_active(now)));
}

#[tokio::test]
async fn should_return_too_many_requests_when_rate_limited() {
    let repo = MockOtpChallengeRepo::empty();
    let challenges = repo.challenges_handle();

    let uc = IssueOtpUseCase {
        limiter: MockRateLimiter::new(2),
        challenges: repo,
    };
    uc.execute(input("reader@bookly.test")).await.unwrap();
    uc.execute(input("reader@bookly.test")).await.unwrap();
    let result = uc.execute(input("reader@bookly.test")).await;

    assert!(
        matches!(result, Err(AuthServiceError::TooManyRequests)),
        "expected TooManyRequests, got {result:?}"
    );
    assert_eq!(challenges.lock().unwrap().len(), 2);

    // The quota is per email.
    uc.execute(input("other@bookly.test")).await.unwrap();
}
