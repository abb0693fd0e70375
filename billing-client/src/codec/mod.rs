//! Conversion between the external JSON tree, the domain record and the
//! compact storage payload.
//!
//! - [`decode`] validates an external record and builds a
//!   [`BillingYear`](crate::domain::BillingYear).
//!   Every violation is collected before failing.
//! - [`encode_for_storage`] / [`decode_record_from_storage`] are exact
//!   inverses.
//! - [`decode_from_storage`] additionally derives the read-side
//!   [`BillingYearView`] (metric values, meter type literals, month labels).

mod decode;
mod storage;
mod view;

use std::fmt;

use serde::Serialize;

use crate::error::ErrorKind;

pub use decode::{decode, decode_str};
pub use storage::{decode_from_storage, decode_record_from_storage, encode_for_storage};
pub use view::{BillingMonthView, BillingYearView, DateView, MeterView, MetricView, SimpleMetricView};

/// A single problem found while validating an external record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every violation found in one record, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub(crate) fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.path.as_str())
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s)", self.violations.len())?;
        for (i, v) in self.violations.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { "; " })?;
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("invalid billing record: {0}")]
    Validation(ValidationReport),
    #[error("stored billing record is unreadable: {0}")]
    Corrupt(String),
    #[error("failed to serialize billing record: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Corrupt(_) | Self::Serialize(_) => ErrorKind::Storage,
        }
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Validation(report) => Some(report),
            _ => None,
        }
    }
}
