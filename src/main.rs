//! shop-checkout server binary.

use shop_checkout::bootstrap::{
    build_router, build_state, init_tracing, shutdown_signal, spawn_webhook_purge, Adapters,
    StartupError,
};
use shop_checkout::config::{AppConfig, ConfigError};

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate().map_err(ConfigError::from)?;

    let adapters = Adapters::from_config(&config).await?;
    let _purge = spawn_webhook_purge(
        adapters.processed_webhooks.clone(),
        config.checkout.webhook_retention_days,
    );

    let state = build_state(adapters, &config);
    let app = build_router(state, &config.server);

    let addr = config.server.socket_addr().map_err(ConfigError::from)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "shop-checkout listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
