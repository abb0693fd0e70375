use serde::{Deserialize, Serialize};

use crate::schema::FieldCategory;

/// A leaf reading. Several subcomponents appear when a rate changed part way
/// through a billing period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metric {
    pub subcomponent_values: Vec<f64>,
}

impl Metric {
    pub fn new(subcomponent_values: Vec<f64>) -> Self {
        Self {
            subcomponent_values,
        }
    }

    /// Sum of the subcomponents, or `None` when there is no reading at all.
    pub fn value(&self) -> Option<f64> {
        if self.subcomponent_values.is_empty() {
            None
        } else {
            Some(self.subcomponent_values.iter().sum())
        }
    }

    /// Every subcomponent and their sum are finite. A sum that overflows
    /// would serialize as `null` and read like a missing reading.
    pub fn is_finite(&self) -> bool {
        self.subcomponent_values.iter().all(|v| v.is_finite())
            && self.value().map_or(true, f64::is_finite)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TouMetric {
    pub peak: Metric,
    pub off_peak: Metric,
    pub total: Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Simple(Metric),
    TimeOfUse(TouMetric),
}

impl MetricValue {
    pub fn category(&self) -> FieldCategory {
        match self {
            Self::Simple(_) => FieldCategory::Simple,
            Self::TimeOfUse(_) => FieldCategory::TimeOfUse,
        }
    }

    pub fn as_simple(&self) -> Option<&Metric> {
        match self {
            Self::Simple(m) => Some(m),
            Self::TimeOfUse(_) => None,
        }
    }

    pub fn as_tou(&self) -> Option<&TouMetric> {
        match self {
            Self::TimeOfUse(t) => Some(t),
            Self::Simple(_) => None,
        }
    }
}
