use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::metric::{Metric, MetricValue, TouMetric};
use crate::schema::{Field, FieldCategory, MeterType};

/// One meter's readings within a billing month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterRecord {
    pub meter_type: MeterType,
    pub billing_date: Option<String>,
    pub service_end_date: Option<String>,
    pub metrics: MeterMetrics,
}

/// The 20 metric fields of a meter, each holding a value of the shape the
/// schema declares for it. Construction goes through [`MeterMetrics::from_map`]
/// so a partial or mis-shaped set cannot exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Field, MetricValue>",
    into = "BTreeMap<Field, MetricValue>"
)]
pub struct MeterMetrics {
    values: BTreeMap<Field, MetricValue>,
}

impl MeterMetrics {
    /// Checks the map against the canonical metric field set. On failure
    /// returns one message per offending field.
    pub fn from_map(values: BTreeMap<Field, MetricValue>) -> Result<Self, Vec<String>> {
        let mut problems = Vec::new();

        for field in Field::metric_fields() {
            match values.get(&field) {
                None => problems.push(format!("{field}: missing")),
                Some(v) if v.category() != field.category() => problems.push(format!(
                    "{field}: expected {} metric, found {}",
                    field.category().as_str(),
                    v.category().as_str()
                )),
                Some(_) => {}
            }
        }
        for field in values.keys() {
            if field.category() == FieldCategory::Date {
                problems.push(format!("{field}: date field stored as metric"));
            }
        }

        if problems.is_empty() {
            Ok(Self { values })
        } else {
            Err(problems)
        }
    }

    /// A metric set with every reading empty.
    pub fn empty() -> Self {
        let values = Field::metric_fields()
            .map(|f| {
                let v = match f.category() {
                    FieldCategory::TimeOfUse => MetricValue::TimeOfUse(TouMetric::default()),
                    _ => MetricValue::Simple(Metric::default()),
                };
                (f, v)
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, field: Field) -> Option<&MetricValue> {
        self.values.get(&field)
    }

    /// Iterates in canonical field order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &MetricValue)> {
        self.values.iter().map(|(f, v)| (*f, v))
    }
}

impl TryFrom<BTreeMap<Field, MetricValue>> for MeterMetrics {
    type Error = String;

    fn try_from(values: BTreeMap<Field, MetricValue>) -> Result<Self, Self::Error> {
        Self::from_map(values).map_err(|problems| problems.join("; "))
    }
}

impl From<MeterMetrics> for BTreeMap<Field, MetricValue> {
    fn from(m: MeterMetrics) -> Self {
        m.values
    }
}
