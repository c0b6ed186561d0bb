use std::path::Path;
use std::sync::Arc;

use marquee_api::{
    api::{create_router, AppState},
    config::{Config, StoreBackend},
    db::{
        create_pool, create_redis_client, postgres::run_migrations, Cache, CatalogStore,
        InMemoryStore, PgCatalogStore,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn CatalogStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = create_pool(&config.database_url, config.db_max_connections).await?;
            run_migrations(&pool).await?;
            tracing::info!("Connected to PostgreSQL");
            Arc::new(PgCatalogStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            match config.seed_path.as_deref() {
                Some(path) => Arc::new(InMemoryStore::from_seed_file(Path::new(path))?),
                None => Arc::new(InMemoryStore::new()),
            }
        }
    };

    let (cache, cache_writer) = match config.redis_url.as_deref() {
        Some(url) => {
            let (cache, handle) = Cache::new(create_redis_client(url)?);
            tracing::info!("Movie cache enabled");
            (Some(cache), Some(handle))
        }
        None => (None, None),
    };

    let state = AppState::new(store, cache, &config);
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await;
}

/// Resolves once `signal` fires. A signal that cannot be installed never resolves,
/// so the server keeps running.
async fn wait_for_signal<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        // Keep serving; the process can still be stopped externally
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
