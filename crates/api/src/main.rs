//! API server entry point.

use std::sync::Arc;

use api::auth::IdentityResolver;
use api::config::{Config, LogFormat};
use api::state::{AppState, Backends, SharedOrderStore, SharedPaymentProvider};
use order_store::{InMemoryOrderStore, PostgresOrderStore};
use payments::{InMemoryPaymentProvider, StripePaymentProvider};
use secrecy::ExposeSecret;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn order_store(config: &Config) -> Result<(SharedOrderStore, &'static str), BoxError> {
    match &config.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(url.expose_secret())
                .await?;
            let store = PostgresOrderStore::new(pool);
            store.run_migrations().await?;
            tracing::info!("using PostgreSQL order store");
            Ok((Arc::new(store), "postgres"))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory");
            Ok((Arc::new(InMemoryOrderStore::new()), "memory"))
        }
    }
}

fn payment_provider(config: &Config) -> Result<(SharedPaymentProvider, &'static str), BoxError> {
    match config.stripe_config() {
        Some(stripe) => {
            tracing::info!(currency = %stripe.currency, "using Stripe payment provider");
            Ok((Arc::new(StripePaymentProvider::new(stripe)?), "stripe"))
        }
        None => {
            tracing::warn!("STRIPE_SECRET_KEY not set, using in-memory payment provider");
            Ok((Arc::new(InMemoryPaymentProvider::new()), "memory"))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // 1. Load configuration (.env first, real environment wins)
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    // 2. Initialize tracing
    init_tracing(&config);

    // 3. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;
    api::routes::metrics::describe();

    // 4. Select backends and build application state
    let (store, store_backend) = order_store(&config).await?;
    let (provider, provider_backend) = payment_provider(&config)?;

    if config.auth_tokens.is_empty() {
        tracing::warn!("AUTH_TOKENS not set, every authenticated endpoint will reject requests");
    }
    let identity: Arc<dyn IdentityResolver> = Arc::new(api::static_identity(&config));

    let state = AppState::new(store, provider, identity, config.admin_api_key.clone())
        .with_backends(Backends {
            store: store_backend,
            provider: provider_backend,
        });

    // 5. Build the application
    let app = api::create_app(Arc::new(state), metrics_handle, &config.cors_origins);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}
