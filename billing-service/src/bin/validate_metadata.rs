use std::path::PathBuf;

use anyhow::{Context, Result};
use billing_client::metadata::{BillingMetadata, MetadataCatalog};
use billing_client::{FieldCategory, MeterType};
use billing_service::{config::AppConfig, observability};

fn main() -> Result<()> {
    observability::init_tracing();

    let path = match std::env::args().nth(1) {
        Some(p) => PathBuf::from(p),
        None => AppConfig::load()?.metadata.path,
    };

    let catalog = MetadataCatalog::new(path);
    let md = catalog
        .load()
        .with_context(|| format!("{} is not valid billing metadata", catalog.source().display()))?;

    println!("{}: ok", catalog.source().display());
    print_summary(&md);
    Ok(())
}

fn print_summary(md: &BillingMetadata) {
    for meter_type in MeterType::all() {
        let meter = md.meter(meter_type);
        let count = |category: FieldCategory| {
            meter
                .fields
                .values()
                .filter(|d| d.metadata.category() == category)
                .count()
        };
        println!(
            "  {}: {} fields ({} date, {} simple, {} time-of-use)",
            meter_type.catalog_key(),
            meter.fields.len(),
            count(FieldCategory::Date),
            count(FieldCategory::Simple),
            count(FieldCategory::TimeOfUse),
        );
    }
}
