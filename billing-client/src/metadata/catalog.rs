use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use super::loader::load_file;
use super::model::{BillingMetadata, CatalogView, MeterMetadata};
use super::CatalogError;
use crate::schema::{Field, MeterType};

/// Loads the metadata source once and serves lookups from the cached copy.
///
/// Owned by whoever starts the service and shared by reference. Readers never
/// block; a reader racing a `clear`/`reload` sees either the old or the new
/// value.
pub struct MetadataCatalog {
    source: PathBuf,
    cache: ArcSwapOption<BillingMetadata>,
}

impl MetadataCatalog {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            cache: ArcSwapOption::empty(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.load().is_some()
    }

    /// Returns the cached catalog, reading and validating the source first if
    /// nothing is cached.
    pub fn load(&self) -> Result<Arc<BillingMetadata>, CatalogError> {
        if let Some(cached) = self.cache.load_full() {
            return Ok(cached);
        }
        let fresh = Arc::new(load_file(&self.source)?);
        self.cache.store(Some(Arc::clone(&fresh)));
        tracing::info!(source = %self.source.display(), "metadata catalog loaded");
        Ok(fresh)
    }

    /// Drops the cached value; the next `load` re-reads the source.
    pub fn clear(&self) {
        self.cache.store(None);
    }

    /// Re-reads the source and swaps it in. On failure the previous value
    /// stays cached.
    pub fn reload(&self) -> Result<Arc<BillingMetadata>, CatalogError> {
        match load_file(&self.source) {
            Ok(md) => {
                let fresh = Arc::new(md);
                self.cache.store(Some(Arc::clone(&fresh)));
                tracing::info!(source = %self.source.display(), "metadata catalog reloaded");
                Ok(fresh)
            }
            Err(e) => {
                tracing::warn!(error = %e, "metadata reload failed, keeping previous catalog");
                Err(e)
            }
        }
    }

    /// Full catalog, one meter type, or one field of one meter type.
    ///
    /// `field` only applies together with `meter_type`; on its own it is
    /// ignored and the full catalog is returned.
    pub fn lookup(
        &self,
        meter_type: Option<&str>,
        field: Option<&str>,
    ) -> Result<CatalogView, CatalogError> {
        let md = self.load()?;

        let Some(meter_key) = meter_type else {
            return Ok(CatalogView::from(md.as_ref()));
        };
        let meter_type =
            MeterType::from_catalog_key(meter_key).ok_or_else(|| CatalogError::MeterTypeNotFound {
                given: meter_key.to_string(),
                valid_values: MeterType::catalog_keys(),
            })?;
        let meter = md.meter(meter_type);

        let selected = match field {
            None => meter.clone(),
            Some(name) => {
                let found = Field::from_name(name)
                    .and_then(|f| meter.fields.get_key_value(&f))
                    .map(|(f, d)| (*f, d.clone()));
                let Some((f, descriptor)) = found else {
                    return Err(CatalogError::FieldNotFound {
                        meter_type: meter_type.catalog_key(),
                        given: name.to_string(),
                        available_fields: meter.field_names(),
                    });
                };
                MeterMetadata {
                    fields: BTreeMap::from([(f, descriptor)]),
                }
            }
        };

        Ok(CatalogView {
            meters: BTreeMap::from([(meter_type.catalog_key(), selected)]),
        })
    }
}
