pub mod billing_year_store;

use crate::error::ErrorKind;

pub use billing_year_store::{
    BillingYearStore, NewBillingYearRecord, SqliteBillingYearStore, StoredBillingYear,
};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("billing year {0} not found")]
    NotFound(i64),
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}
