//! Canonical field set shared by every meter record and by the metadata
//! catalog.
//!
//! The set is closed: 2 date fields, 5 time-of-use metrics and 15 simple
//! metrics. Generation and benefit meters carry exactly the same fields.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Structural category of a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCategory {
    Date,
    Simple,
    TimeOfUse,
}

impl FieldCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Simple => "simple",
            Self::TimeOfUse => "time-of-use",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Field {
    BillingDate,
    ServiceEndDate,

    #[strum(serialize = "energy_export_meter_channel_2")]
    #[serde(rename = "energy_export_meter_channel_2")]
    EnergyExportMeterChannel2,
    #[strum(serialize = "energy_import_meter_channel_1")]
    #[serde(rename = "energy_import_meter_channel_1")]
    EnergyImportMeterChannel1,
    AllocatedExportEnergyCredits,
    NetEnergyUsageAfterCredits,
    PceEnergyCost,

    PceNetGenerationBonus,
    PceEnergyCommissionSurcharge,
    PceTotalEnergyCharges,
    PceNemCredit,
    PceGenerationChargesDueCash,

    PgeResEnergyCharges,
    PgeBaselineCredit,
    PgeDaCcaCharges,
    PgeTotalEnergyCharges,
    PgeNemBilling,
    PgeMinimumDeliveryCharge,
    PgeNemTrueUpAdjustment,
    PgeElectricDeliveryCharges,

    CaliforniaClimateCredit,
    TotalBillInMail,
}

impl Field {
    pub const COUNT: usize = 22;

    pub const fn category(self) -> FieldCategory {
        match self {
            Self::BillingDate | Self::ServiceEndDate => FieldCategory::Date,
            Self::EnergyExportMeterChannel2
            | Self::EnergyImportMeterChannel1
            | Self::AllocatedExportEnergyCredits
            | Self::NetEnergyUsageAfterCredits
            | Self::PceEnergyCost => FieldCategory::TimeOfUse,
            _ => FieldCategory::Simple,
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    pub fn all() -> impl Iterator<Item = Field> {
        Self::iter()
    }

    pub fn date_fields() -> impl Iterator<Item = Field> {
        Self::iter().filter(|f| f.category() == FieldCategory::Date)
    }

    /// The 20 non-date fields.
    pub fn metric_fields() -> impl Iterator<Item = Field> {
        Self::iter().filter(|f| f.category() != FieldCategory::Date)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Physical meter kind. Both kinds share the canonical field set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Serialize, Deserialize,
)]
pub enum MeterType {
    #[serde(rename = "GENERATION_METER")]
    Generation,
    #[serde(rename = "BENEFIT_METER")]
    Benefit,
}

impl MeterType {
    /// Literal used inside billing records.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generation => "GENERATION_METER",
            Self::Benefit => "BENEFIT_METER",
        }
    }

    /// Key used by the metadata catalog and its HTTP filter.
    pub const fn catalog_key(self) -> &'static str {
        match self {
            Self::Generation => "generation_meter",
            Self::Benefit => "benefit_meter",
        }
    }

    /// Parses a record literal. Unrecognized literals are rejected rather
    /// than defaulted.
    pub fn from_record_literal(s: &str) -> Option<Self> {
        match s {
            "GENERATION_METER" | "GenerationMeter" => Some(Self::Generation),
            "BENEFIT_METER" | "BenefitMeter" => Some(Self::Benefit),
            _ => None,
        }
    }

    pub fn from_catalog_key(s: &str) -> Option<Self> {
        Self::iter().find(|m| m.catalog_key() == s)
    }

    pub fn all() -> impl Iterator<Item = MeterType> {
        Self::iter()
    }

    pub fn catalog_keys() -> Vec<&'static str> {
        Self::all().map(Self::catalog_key).collect()
    }
}

pub const RECORD_METER_LITERALS: &[&str] =
    &["GENERATION_METER", "GenerationMeter", "BENEFIT_METER", "BenefitMeter"];
