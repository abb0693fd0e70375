//! Unit and provenance description of every canonical field, per meter type.

mod catalog;
mod loader;
mod model;

use std::path::PathBuf;

use crate::error::ErrorKind;

pub use catalog::MetadataCatalog;
pub use loader::{load_file, parse_metadata};
pub use model::{
    BillingMetadata, CatalogView, DateFieldMetadata, FieldDescriptor, FieldMetadata, FieldSource,
    MeterMetadata, SimpleFieldMetadata, TouFieldMetadata, Unit, WhereFrom,
};

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("metadata source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },
    #[error("failed to read metadata source {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("metadata does not match the billing schema: {}", details.join("; "))]
    SchemaMismatch { details: Vec<String> },
    #[error("invalid value {value:?} at {path}, expected one of {}", expected.join(", "))]
    InvalidEnumValue {
        path: String,
        value: String,
        expected: Vec<&'static str>,
    },
    #[error("invalid meter_type: {given}")]
    MeterTypeNotFound {
        given: String,
        valid_values: Vec<&'static str>,
    },
    #[error("field '{given}' not found in {meter_type}")]
    FieldNotFound {
        meter_type: &'static str,
        given: String,
        available_fields: Vec<String>,
    },
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceNotFound { .. } | Self::MeterTypeNotFound { .. } | Self::FieldNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::Io { .. } => ErrorKind::Storage,
            Self::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
            Self::InvalidEnumValue { .. } => ErrorKind::InvalidEnumValue,
        }
    }
}
