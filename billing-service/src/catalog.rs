//! Metadata catalog loads performed by the server, counted for `/metrics`.

use std::sync::Arc;

use billing_client::metadata::{BillingMetadata, CatalogError, MetadataCatalog};

use crate::metrics_server::METADATA_CATALOG_LOADS_TOTAL;

/// Loads the catalog, counting only reads of the source.
pub fn load(catalog: &MetadataCatalog) -> Result<Arc<BillingMetadata>, CatalogError> {
    let cached = catalog.is_loaded();
    let md = catalog.load()?;
    if !cached {
        metrics::counter!(METADATA_CATALOG_LOADS_TOTAL).increment(1);
    }
    Ok(md)
}

/// Re-reads the source. A failed reload keeps the previous catalog and is
/// not counted.
pub fn reload(catalog: &MetadataCatalog) -> Result<Arc<BillingMetadata>, CatalogError> {
    let md = catalog.reload()?;
    metrics::counter!(METADATA_CATALOG_LOADS_TOTAL).increment(1);
    Ok(md)
}

/// Reloads the catalog on every SIGHUP until the signal stream ends.
#[cfg(unix)]
pub async fn reload_on_hangup(catalog: Arc<MetadataCatalog>) -> anyhow::Result<()> {
    use anyhow::Context;
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup()).context("failed to register SIGHUP handler")?;
    while hangup.recv().await.is_some() {
        tracing::info!(source = %catalog.source().display(), "SIGHUP received, reloading metadata");
        if let Err(e) = reload(&catalog) {
            tracing::error!(error = %e, "metadata reload failed");
        }
    }
    Ok(())
}
