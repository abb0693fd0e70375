use std::path::Path;

use anyhow::{bail, Result};
use billing_client::db::SqliteBillingYearStore;
use billing_service::{config::AppConfig, import, observability};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: import_billing_year <billing_year.json>...");
    }

    // Point BILLING_CONFIG at another file to import into a different database.
    let cfg = AppConfig::load()?;

    let store =
        SqliteBillingYearStore::connect(&cfg.database.url, cfg.database.max_connections).await?;
    store.init().await?;

    for path in &paths {
        let id = import::import_file(&store, Path::new(path)).await?;
        println!("{path}: stored as billing year {id}");
    }

    Ok(())
}
