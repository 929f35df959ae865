//! Interactive email-OTP sign-in against a running auth service.
//!
//! ```bash
//! cargo run -p otp-login -- --base-url http://localhost:3112 --email reader@bookly.test
//! ```
//!
//! After the code is sent, type the digits (or part of them), `resend`,
//! `status` or `quit`.

use anyhow::{Context as _, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use url::Url;

use bookly_core::tracing::init_pretty_tracing;
use bookly_domain::email::Email;
use bookly_otp::http::AuthClient;
use bookly_otp::{OtpError, OtpFlow, Outcome};

mod console;

use console::{ConsoleNavigator, ConsoleNotifier, render};

type Flow = OtpFlow<AuthClient, AuthClient, ConsoleNavigator, ConsoleNotifier>;

#[derive(Parser)]
#[command(about = "Sign in to Bookly with an emailed one-time code")]
struct Args {
    /// Base URL of the auth service (e.g. http://localhost:3112)
    #[arg(long)]
    base_url: Url,

    /// Email to send the code to; prompted for when omitted
    #[arg(long)]
    email: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_pretty_tracing("warn,bookly_otp=info");
    let args = Args::parse();

    let client = AuthClient::new(args.base_url)?;
    let flow: Flow = OtpFlow::new(
        client.clone(),
        client,
        ConsoleNavigator,
        ConsoleNotifier,
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut preset = args.email;
    loop {
        let raw = match preset.take() {
            Some(raw) => raw,
            None => match prompt(&mut lines, "email: ").await? {
                Some(raw) => raw,
                None => return Ok(()),
            },
        };
        let email = match Email::parse(&raw) {
            Ok(email) => email,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        match flow.request_code(email).await {
            Ok(_) => break,
            Err(OtpError::SendFailed) => continue,
            Err(e) => return Err(e.into()),
        }
    }

    println!("{}", render(&flow.snapshot()));
    enter_code(&flow, &mut lines).await
}

async fn enter_code(flow: &Flow, lines: &mut Lines<BufReader<Stdin>>) -> Result<()> {
    while let Some(line) = prompt(lines, "> ").await? {
        let outcome = match line.as_str() {
            "" => continue,
            "quit" => break,
            "status" => {
                println!("{}", render(&flow.snapshot()));
                continue;
            }
            "resend" => flow.resend().await,
            digits => flow.input(digits).await,
        };
        match outcome {
            Ok(Outcome::Verified(_)) => return Ok(()),
            Ok(Outcome::Ignored) => println!("{}", render(&flow.snapshot())),
            Ok(_) | Err(OtpError::SendFailed | OtpError::VerifyFailed) => {}
            Err(e) => return Err(e.into()),
        }
    }
    flow.teardown();
    Ok(())
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<Option<String>> {
    use std::io::Write as _;
    print!("{label}");
    std::io::stdout().flush().context("flush stdout")?;
    let line = lines.next_line().await.context("read stdin")?;
    Ok(line.map(|l| l.trim().to_owned()))
}
