use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::{Value, json};
use url::Url;

use bookly_domain::destination::Destination;
use bookly_domain::email::Email;
use bookly_domain::otp::OtpCode;
use bookly_otp::http::AuthClient;
use bookly_otp::{CredentialStore, SessionEstablisher};

use crate::helpers::test_email;

const GOOD_CODE: &str = "424242";
const SESSION_COOKIE: &str = "bookly_session=signed-token";

#[derive(Clone, Default)]
struct FakeAuth {
    issued_for: Arc<Mutex<Vec<String>>>,
    signed_in: Arc<Mutex<Option<String>>>,
}

async fn issue(State(auth): State<FakeAuth>, Json(body): Json<Value>) -> StatusCode {
    let email = body["email"].as_str().unwrap_or_default().to_owned();
    auth.issued_for.lock().unwrap().push(email);
    StatusCode::CREATED
}

async fn redeem(State(auth): State<FakeAuth>, Json(body): Json<Value>) -> Response {
    if body["code"] != GOOD_CODE {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let email = body["email"].as_str().unwrap_or_default().to_owned();
    *auth.signed_in.lock().unwrap() = Some(email);
    (
        StatusCode::CREATED,
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/; HttpOnly"))],
        Json(json!({ "redirect": "/onboarding", "expires_at": "2026-10-24T00:00:00.000Z" })),
    )
        .into_response()
}

async fn session(State(auth): State<FakeAuth>, headers: HeaderMap) -> Response {
    let has_cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(SESSION_COOKIE));
    let signed_in = auth.signed_in.lock().unwrap().clone();
    match signed_in {
        Some(email) if has_cookie => Json(json!({
            "user_id": "0192f0c4-1111-7000-8000-000000000001",
            "email": email,
            "onboarded": false,
            "redirect": "/onboarding",
            "expires_at": "2026-10-24T00:00:00.000Z",
        }))
        .into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn spawn_fake_auth() -> (Url, FakeAuth) {
    let auth = FakeAuth::default();
    let app = Router::new()
        .route("/auth/otp", post(issue))
        .route("/auth/session", post(redeem).get(session))
        .with_state(auth.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (Url::parse(&format!("http://{addr}")).unwrap(), auth)
}

#[tokio::test]
async fn should_issue_redeem_and_establish_session() {
    let (base, auth) = spawn_fake_auth().await;
    let client = AuthClient::new(base).unwrap();
    let email = test_email();

    client.issue_code(&email).await.unwrap();
    assert_eq!(
        *auth.issued_for.lock().unwrap(),
        vec![email.as_str().to_owned()]
    );

    let code = OtpCode::parse(GOOD_CODE).unwrap();
    client.redeem_code(&email, &code).await.unwrap();

    let destination = client.establish(&email).await.unwrap();
    assert_eq!(destination, Destination::Onboarding);
}

#[tokio::test]
async fn should_fail_redeem_when_code_is_rejected() {
    let (base, _auth) = spawn_fake_auth().await;
    let client = AuthClient::new(base).unwrap();
    let email = test_email();

    let code = OtpCode::parse("000000").unwrap();
    let result = client.redeem_code(&email, &code).await;
    assert!(result.is_err(), "expected rejection, got {result:?}");

    let result = client.establish(&email).await;
    assert!(result.is_err(), "no session cookie, got {result:?}");
}

#[tokio::test]
async fn should_reject_session_for_another_email() {
    let (base, _auth) = spawn_fake_auth().await;
    let client = AuthClient::new(base).unwrap();
    let email = test_email();

    let code = OtpCode::parse(GOOD_CODE).unwrap();
    client.redeem_code(&email, &code).await.unwrap();

    let other = Email::parse("someone.else@bookly.test").unwrap();
    let result = client.establish(&other).await;
    assert!(result.is_err(), "expected mismatch error, got {result:?}");
}
