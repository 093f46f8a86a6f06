use anyhow::Context;
use tokio_util::sync::CancellationToken;

use stockmaster_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    stockmaster_observability::init(&config.log);

    let shutdown = CancellationToken::new();
    let app = stockmaster_api::app::build_app(&config.reconciliation, shutdown.clone());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        address = %listener.local_addr()?,
        environment = %config.environment,
        capacity_policy = ?config.reconciliation.capacity_policy,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("server terminated")?;
    Ok(())
}

/// Resolves on ctrl-c and cancels every in-flight engine call.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "ctrl-c handler unavailable; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
    shutdown.cancel();
}
