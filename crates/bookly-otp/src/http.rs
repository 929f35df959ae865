//! [`CredentialStore`] and [`SessionEstablisher`] over the auth service's HTTP API.

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use url::Url;

use bookly_domain::destination::Destination;
use bookly_domain::email::Email;
use bookly_domain::otp::OtpCode;

use crate::ports::{CredentialStore, SessionEstablisher};

/// Auth service client. Keeps the session cookie in its own cookie store.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base: Url,
}

#[derive(Serialize)]
struct IssueCodeRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct RedeemCodeRequest<'a> {
    email: &'a str,
    code: &'a str,
}

/// Body of `GET /auth/session`.
#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub email: String,
    pub onboarded: bool,
    pub redirect: Destination,
}

impl AuthClient {
    pub fn new(mut base: Url) -> anyhow::Result<Self> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .context("build HTTP client")?;
        Ok(Self { http, base })
    }

    fn endpoint(&self, path: &str) -> anyhow::Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("join {path} onto {}", self.base))
    }

    /// Current session, if the cookie store holds a valid one.
    pub async fn session(&self) -> anyhow::Result<SessionResponse> {
        self.http
            .get(self.endpoint("auth/session")?)
            .send()
            .await
            .context("GET /auth/session")?
            .error_for_status()
            .context("GET /auth/session")?
            .json()
            .await
            .context("decode session response")
    }
}

impl CredentialStore for AuthClient {
    async fn issue_code(&self, email: &Email) -> anyhow::Result<()> {
        self.http
            .post(self.endpoint("auth/otp")?)
            .json(&IssueCodeRequest {
                email: email.as_str(),
            })
            .send()
            .await
            .context("POST /auth/otp")?
            .error_for_status()
            .context("POST /auth/otp")?;
        Ok(())
    }

    async fn redeem_code(&self, email: &Email, code: &OtpCode) -> anyhow::Result<()> {
        self.http
            .post(self.endpoint("auth/session")?)
            .json(&RedeemCodeRequest {
                email: email.as_str(),
                code: code.as_str(),
            })
            .send()
            .await
            .context("POST /auth/session")?
            .error_for_status()
            .context("POST /auth/session")?;
        Ok(())
    }
}

impl SessionEstablisher for AuthClient {
    async fn establish(&self, email: &Email) -> anyhow::Result<Destination> {
        let session = self.session().await?;
        if session.email != email.as_str() {
            anyhow::bail!("session belongs to {}, expected {email}", session.email);
        }
        Ok(session.redirect)
    }
}
