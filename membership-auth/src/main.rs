use membership_auth::{
    build_auth_service, build_router,
    config::AuthConfig,
    services::{AuthService, NoopEmailService},
    utils::SystemClock,
    AppState,
};
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level, config.log_format)?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting membership auth service"
    );

    let auth = build_auth_service(
        &config,
        Arc::new(NoopEmailService),
        Arc::new(SystemClock),
    )
    .await?;
    tracing::info!("Storage and token services initialized");

    spawn_reset_token_purge(
        auth.clone(),
        Duration::from_secs(config.reset_token_purge_interval_secs),
    );

    let addr = config.common.socket_addr();
    let config = Arc::new(config);
    let state = AppState::new(config.clone(), auth);
    let app = build_router(state);

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

/// Periodically drop expired and spent reset tokens.
fn spawn_reset_token_purge(auth: AuthService, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // the first tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = auth.purge_expired_reset_tokens().await {
                tracing::warn!(error = %e, "Reset token purge failed");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
