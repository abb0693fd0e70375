use std::path::Path;

use anyhow::Context;
use billing_client::codec::decode_str;
use billing_client::db::{BillingYearStore, NewBillingYearRecord};

/// Decodes one external billing-year document and stores it. Returns the
/// new id.
pub async fn import_str(store: &dyn BillingYearStore, text: &str) -> Result<i64, billing_client::Error> {
    let by = decode_str(text)?;
    let record = NewBillingYearRecord::encode(&by)?;
    let id = store.put(&record).await?;

    tracing::info!(
        id,
        start_month = by.start_month,
        start_year = by.start_year,
        num_months = by.num_months,
        billing_months = by.billing_months.len(),
        "billing year imported"
    );
    Ok(id)
}

pub async fn import_file(store: &dyn BillingYearStore, path: &Path) -> anyhow::Result<i64> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let id = import_str(store, &text)
        .await
        .with_context(|| format!("failed to import {}", path.display()))?;
    Ok(id)
}
