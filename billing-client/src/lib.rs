//! Typed model, codec, metadata catalog and persistence for NEM2A billing
//! years.

pub mod codec;
pub mod db;
pub mod domain;
pub mod error;
pub mod metadata;
pub mod schema;

pub use error::{Error, ErrorKind, Result};
pub use schema::{Field, FieldCategory, MeterType};
