use super::{BillingYearView, CodecError, ValidationReport};
use crate::domain::BillingYear;

/// Serializes a record into the compact payload kept by the store.
///
/// Records that break a structural invariant are refused here so that every
/// stored payload can be read back.
pub fn encode_for_storage(by: &BillingYear) -> Result<Vec<u8>, CodecError> {
    let problems = by.invariant_violations();
    if !problems.is_empty() {
        let mut report = ValidationReport::default();
        for p in problems {
            report.push("$", p);
        }
        return Err(CodecError::Validation(report));
    }
    serde_json::to_vec(by).map_err(CodecError::Serialize)
}

/// Exact inverse of [`encode_for_storage`].
pub fn decode_record_from_storage(bytes: &[u8]) -> Result<BillingYear, CodecError> {
    let by: BillingYear =
        serde_json::from_slice(bytes).map_err(|e| CodecError::Corrupt(e.to_string()))?;
    let problems = by.invariant_violations();
    if !problems.is_empty() {
        return Err(CodecError::Corrupt(problems.join("; ")));
    }
    Ok(by)
}

/// Reads a stored payload into the consumer-facing view, deriving metric
/// values, month labels and meter type literals.
pub fn decode_from_storage(bytes: &[u8]) -> Result<BillingYearView, CodecError> {
    decode_record_from_storage(bytes).map(|by| BillingYearView::from(&by))
}
