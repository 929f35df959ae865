use std::time::Duration;

use sea_orm::Database;
use tokio_util::sync::CancellationToken;
use tracing::info;

use bookly_auth::config::AuthConfig;
use bookly_auth::domain::types::OUTBOX_BATCH_SIZE;
use bookly_auth::infra::email::Mailer;
use bookly_auth::infra::relay::OutboxRelay;
use bookly_auth::router::build_router;
use bookly_auth::state::AppState;
use bookly_auth::usecase::outbox::DispatchOutboxUseCase;
use bookly_auth_types::cookie::CookieSettings;
use bookly_auth_types::session::SessionKey;
use bookly_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing("info,bookly_auth=debug,sqlx=warn");

    let config = AuthConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create Redis pool");

    let state = AppState {
        db,
        redis,
        session_key: SessionKey::new(&config.jwt_secret),
        jwt_secret: config.jwt_secret,
        cookies: CookieSettings {
            domain: config.cookie_domain,
            secure: config.cookie_secure,
        },
        otp_rate_limit_window_secs: config.otp_rate_limit_window_secs,
        otp_rate_limit_max: config.otp_rate_limit_max,
    };

    if config.resend_api_key.is_none() {
        info!("RESEND_API_KEY unset, verification codes will only be logged");
    }
    let relay = OutboxRelay {
        dispatch: DispatchOutboxUseCase {
            outbox: state.outbox_repo(),
            mailer: Mailer::from_config(config.resend_api_key, config.email_from),
            batch_size: OUTBOX_BATCH_SIZE,
        },
        poll_interval: Duration::from_millis(config.outbox_poll_interval_ms.get()),
    };
    let shutdown = CancellationToken::new();
    let relay_handle = tokio::spawn(relay.run(shutdown.clone()));

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("auth service listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .expect("server error");

    shutdown.cancel();
    if let Err(e) = relay_handle.await {
        tracing::error!(error = %e, "outbox relay task panicked");
    }
    info!("auth service stopped");
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("ctrl-c received, shutting down");
    shutdown.cancel();
}
