use crate::codec::CodecError;
use crate::db::StoreError;
use crate::metadata::CatalogError;

/// Coarse classification shared by every error in the crate. Callers map it
/// onto their own surface (HTTP status, exit code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    SchemaMismatch,
    InvalidEnumValue,
    Storage,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Codec(e) => e.kind(),
            Self::Catalog(e) => e.kind(),
            Self::Store(e) => e.kind(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
