use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use billing_client::db::SqliteBillingYearStore;
use billing_client::metadata::MetadataCatalog;
use billing_service::{
    api::{self, AppState},
    catalog,
    config::AppConfig,
    metrics_server, observability,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let store = SqliteBillingYearStore::connect(&cfg.database.url, cfg.database.max_connections)
        .await
        .with_context(|| format!("failed to open database {}", cfg.database.url))?;
    store.init().await?;

    // Refuse to start on a metadata source that disagrees with the schema.
    let metadata = Arc::new(MetadataCatalog::new(&cfg.metadata.path));
    catalog::load(&metadata).context("failed to load billing metadata")?;

    #[cfg(unix)]
    {
        let metadata = Arc::clone(&metadata);
        tokio::spawn(async move {
            if let Err(e) = catalog::reload_on_hangup(metadata).await {
                tracing::error!(error = %e, "metadata reload handler stopped");
            }
        });
    }

    let app = api::router(AppState {
        store: Arc::new(store),
        catalog: metadata,
    });

    let addr: SocketAddr = cfg
        .server
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.bind_addr: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "billing API listening");

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
