use std::collections::BTreeMap;

use serde::Serialize;
use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::schema::{Field, FieldCategory, MeterType};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Unit {
    KilowattHours,
    Dollars,
}

/// Where on (or off) the bill a value comes from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WhereFrom {
    NotProvided,
    PdfBill,
    PdfDetailOfBill,
    Calculated,
    FixedValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSource {
    pub where_from: WhereFrom,
    pub where_on_pdf: Option<String>,
    pub kevins_number_code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateFieldMetadata {
    pub where_found: Vec<FieldSource>,
}

/// Also the shape of each time-of-use slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleFieldMetadata {
    pub unit: Unit,
    pub where_found: Vec<FieldSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TouFieldMetadata {
    pub peak: SimpleFieldMetadata,
    pub off_peak: SimpleFieldMetadata,
    pub total: SimpleFieldMetadata,
}

/// Exactly one variant per field, fixed when the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMetadata {
    DateField(DateFieldMetadata),
    SimpleField(SimpleFieldMetadata),
    TouField(TouFieldMetadata),
}

impl FieldMetadata {
    pub fn category(&self) -> FieldCategory {
        match self {
            Self::DateField(_) => FieldCategory::Date,
            Self::SimpleField(_) => FieldCategory::Simple,
            Self::TouField(_) => FieldCategory::TimeOfUse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub metadata: FieldMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeterMetadata {
    pub fields: BTreeMap<Field, FieldDescriptor>,
}

impl MeterMetadata {
    pub fn field(&self, field: Field) -> Option<&FieldMetadata> {
        self.fields.get(&field).map(|d| &d.metadata)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().map(|f| f.name().to_string()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingMetadata {
    pub generation_meter: MeterMetadata,
    pub benefit_meter: MeterMetadata,
}

impl BillingMetadata {
    pub fn meter(&self, meter_type: MeterType) -> &MeterMetadata {
        match meter_type {
            MeterType::Generation => &self.generation_meter,
            MeterType::Benefit => &self.benefit_meter,
        }
    }
}

/// A full or filtered slice of the catalog, keyed by catalog meter key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CatalogView {
    pub meters: BTreeMap<&'static str, MeterMetadata>,
}

impl From<&BillingMetadata> for CatalogView {
    fn from(m: &BillingMetadata) -> Self {
        let meters = MeterType::all()
            .map(|mt| (mt.catalog_key(), m.meter(mt).clone()))
            .collect();
        Self { meters }
    }
}
