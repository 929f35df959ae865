use anyhow::Context as _;
use serde::Serialize;

use crate::domain::repository::EmailSender;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
const IDEMPOTENCY_KEY: &str = "Idempotency-Key";

pub const OTP_EMAIL_SUBJECT: &str = "Bookly - Verify your email";

pub fn otp_email_html(code: &str) -> String {
    format!("<p>Your OTP is <strong>{code}</strong></p>")
}

#[derive(Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

/// Sends through the Resend HTTP API.
#[derive(Clone)]
pub struct ResendEmailSender {
    pub http: reqwest::Client,
    pub api_key: String,
    pub from: String,
}

impl ResendEmailSender {
    fn otp_request(
        &self,
        to: &str,
        code: &str,
        idempotency_key: &str,
    ) -> reqwest::RequestBuilder {
        let body = ResendEmail {
            from: &self.from,
            to: [to],
            subject: OTP_EMAIL_SUBJECT,
            html: otp_email_html(code),
        };
        self.http
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .header(IDEMPOTENCY_KEY, idempotency_key)
            .json(&body)
    }
}

impl EmailSender for ResendEmailSender {
    async fn send_otp(&self, to: &str, code: &str, idempotency_key: &str) -> anyhow::Result<()> {
        self.otp_request(to, code, idempotency_key)
            .send()
            .await
            .context("POST resend email")?
            .error_for_status()
            .context("resend rejected email")?;
        Ok(())
    }
}

/// Local development sender: writes the code to the log instead of mailing it.
#[derive(Clone, Copy, Default)]
pub struct LoggingEmailSender;

impl EmailSender for LoggingEmailSender {
    async fn send_otp(&self, to: &str, code: &str, idempotency_key: &str) -> anyhow::Result<()> {
        tracing::info!(%to, %code, %idempotency_key, "email delivery disabled, otp logged");
        Ok(())
    }
}

/// Sender picked at startup from configuration.
#[derive(Clone)]
pub enum Mailer {
    Resend(ResendEmailSender),
    Logging(LoggingEmailSender),
}

impl Mailer {
    pub fn from_config(api_key: Option<String>, from: String) -> Self {
        match api_key {
            Some(api_key) => Self::Resend(ResendEmailSender {
                http: reqwest::Client::new(),
                api_key,
                from,
            }),
            None => Self::Logging(LoggingEmailSender),
        }
    }
}

impl EmailSender for Mailer {
    async fn send_otp(&self, to: &str, code: &str, idempotency_key: &str) -> anyhow::Result<()> {
        match self {
            Self::Resend(sender) => sender.send_otp(to, code, idempotency_key).await,
            Self::Logging(sender) => sender.send_otp(to, code, idempotency_key).await,
        }
    }
}
