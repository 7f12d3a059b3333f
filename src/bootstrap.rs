//! Service startup: tracing, adapter selection and the HTTP stack.
//!
//! `main` only calls into this module, so integration tests can build the
//! same router the binary serves.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::adapters::events::LoggingEventPublisher;
use crate::adapters::http::{checkout_router, health, CheckoutAppState};
use crate::adapters::memory::{
    InMemoryCatalog, InMemoryOrderRepository, InMemoryWebhookEventRepository,
};
use crate::adapters::postgres::{
    PostgresOrderRepository, PostgresProductCatalog, PostgresStockReservations,
    PostgresWebhookEventRepository,
};
use crate::adapters::stripe::{MockPaymentGateway, StripeConfig, StripePaymentAdapter};
use crate::application::{
    CheckoutServiceImpl, CreatePaymentIntentHandler, PlaceOrderHandler, PlaceOrderSettings,
};
use crate::config::{AppConfig, ConfigError, DatabaseConfig, LogFormat, ServerConfig};
use crate::domain::foundation::Timestamp;
use crate::ports::{
    EventPublisher, OrderRepository, PaymentGateway, ProductCatalog, StockReservations,
    WebhookEventRepository,
};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// How often processed webhook events past retention are purged.
const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Installs the global subscriber. `RUST_LOG` overrides the configured filter.
pub fn init_tracing(server: &ServerConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let json = server.log_format == LogFormat::Json;
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

/// Port implementations chosen from configuration.
pub struct Adapters {
    pub orders: Arc<dyn OrderRepository>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub stock: Arc<dyn StockReservations>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub processed_webhooks: Arc<dyn WebhookEventRepository>,
    pub event_publisher: Arc<dyn EventPublisher>,
}

impl Adapters {
    /// Postgres when a database is configured, in-memory otherwise; Stripe
    /// when both keys are set, the mock gateway otherwise. The mock is
    /// refused in front of a database unless `payment.use_mock_gateway` is set.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        config.check_gateway().map_err(ConfigError::from)?;

        let gateway: Arc<dyn PaymentGateway> =
            match StripeConfig::from_payment_config(&config.payment) {
                Some(stripe) => {
                    tracing::info!(
                        test_mode = config.payment.is_test_mode(),
                        "Using Stripe payment gateway"
                    );
                    Arc::new(StripePaymentAdapter::new(stripe))
                }
                None => {
                    tracing::warn!("Stripe keys not configured, using mock payment gateway");
                    Arc::new(MockPaymentGateway::new())
                }
            };
        let event_publisher: Arc<dyn EventPublisher> = Arc::new(LoggingEventPublisher::new());

        match &config.database {
            Some(database) => {
                let pool = connect(database).await?;
                Ok(Self {
                    orders: Arc::new(PostgresOrderRepository::new(pool.clone())),
                    catalog: Arc::new(PostgresProductCatalog::new(pool.clone())),
                    stock: Arc::new(PostgresStockReservations::new(pool.clone())),
                    gateway,
                    processed_webhooks: Arc::new(PostgresWebhookEventRepository::new(pool)),
                    event_publisher,
                })
            }
            None => {
                tracing::warn!("No database configured, using in-memory adapters");
                let catalog = Arc::new(InMemoryCatalog::new());
                Ok(Self {
                    orders: Arc::new(InMemoryOrderRepository::new()),
                    catalog: catalog.clone(),
                    stock: catalog,
                    gateway,
                    processed_webhooks: Arc::new(InMemoryWebhookEventRepository::new()),
                    event_publisher,
                })
            }
        }
    }
}

/// Opens the pool and applies pending migrations when enabled.
pub async fn connect(database: &DatabaseConfig) -> Result<PgPool, StartupError> {
    let pool = PgPoolOptions::new()
        .min_connections(database.min_connections)
        .max_connections(database.max_connections)
        .acquire_timeout(database.acquire_timeout())
        .idle_timeout(database.idle_timeout())
        .connect(&database.url)
        .await?;
    tracing::info!(url = %database.redacted_url(), "Database pool created");

    if database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }
    Ok(pool)
}

/// Wires the checkout service over `adapters`.
pub fn build_state(adapters: Adapters, config: &AppConfig) -> CheckoutAppState {
    let retry = config.checkout.retry_policy();
    let settings = PlaceOrderSettings {
        currency: config.payment.currency.to_lowercase(),
        max_items: config.checkout.max_items_per_order,
        reject_price_changes: config.checkout.reject_price_changes,
        retry,
    };

    let place_order = PlaceOrderHandler::new(
        adapters.orders.clone(),
        adapters.catalog,
        adapters.stock.clone(),
        adapters.gateway.clone(),
        adapters.event_publisher.clone(),
    )
    .with_settings(settings);
    let create_intent = CreatePaymentIntentHandler::new(adapters.gateway.clone()).with_retry(retry);

    CheckoutAppState {
        checkout: Arc::new(CheckoutServiceImpl::new(
            Arc::new(place_order),
            Arc::new(create_intent),
        )),
        orders: adapters.orders,
        stock: adapters.stock,
        gateway: adapters.gateway,
        processed_webhooks: adapters.processed_webhooks,
        event_publisher: adapters.event_publisher,
    }
}

/// The full HTTP application: API routes, health check and middleware.
pub fn build_router(state: CheckoutAppState, server: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(cors_layer(server));

    Router::new()
        .route("/health", get(health))
        .nest("/api", checkout_router())
        .with_state(state)
        .layer(middleware)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}

/// Periodically deletes ledger entries older than `retention_days`.
pub fn spawn_webhook_purge(
    processed: Arc<dyn WebhookEventRepository>,
    retention_days: u32,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let retention = chrono::Duration::days(i64::from(retention_days));
            let cutoff = Timestamp::from_datetime(chrono::Utc::now() - retention);
            match processed.delete_before(cutoff).await {
                Ok(0) => {}
                Ok(deleted) => tracing::info!(deleted, "Purged processed webhook events"),
                Err(e) => tracing::warn!(error = %e, "Webhook event purge failed"),
            }
        }
    })
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
