use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{BillingMonth, BillingYear, MeterRecord, Metric, MetricValue, MonthLabel};
use crate::schema::Field;

/// Read-side shape of a billing year. Richer than the stored payload and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingYearView {
    pub start_month: u8,
    pub start_year: i32,
    pub num_months: u32,
    pub months: Vec<MonthLabel>,
    pub billing_months: Vec<BillingMonthView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingMonthView {
    pub year: i32,
    pub month: u8,
    pub month_label: MonthLabel,
    pub main: MeterView,
    pub adu: MeterView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterView {
    pub nem2a_meter_type: &'static str,
    pub billing_date: DateView,
    pub service_end_date: DateView,
    #[serde(flatten)]
    pub metrics: BTreeMap<Field, MetricView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateView {
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleMetricView {
    pub subcomponent_values: Vec<f64>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricView {
    Simple(SimpleMetricView),
    TimeOfUse {
        peak: SimpleMetricView,
        off_peak: SimpleMetricView,
        total: SimpleMetricView,
    },
}

impl From<&Metric> for SimpleMetricView {
    fn from(m: &Metric) -> Self {
        Self {
            subcomponent_values: m.subcomponent_values.clone(),
            value: m.value(),
        }
    }
}

impl From<&MetricValue> for MetricView {
    fn from(v: &MetricValue) -> Self {
        match v {
            MetricValue::Simple(m) => Self::Simple(m.into()),
            MetricValue::TimeOfUse(t) => Self::TimeOfUse {
                peak: (&t.peak).into(),
                off_peak: (&t.off_peak).into(),
                total: (&t.total).into(),
            },
        }
    }
}

impl From<&MeterRecord> for MeterView {
    fn from(m: &MeterRecord) -> Self {
        Self {
            nem2a_meter_type: m.meter_type.as_str(),
            billing_date: DateView {
                value: m.billing_date.clone(),
            },
            service_end_date: DateView {
                value: m.service_end_date.clone(),
            },
            metrics: m.metrics.iter().map(|(f, v)| (f, v.into())).collect(),
        }
    }
}

impl From<&BillingMonth> for BillingMonthView {
    fn from(bm: &BillingMonth) -> Self {
        Self {
            year: bm.year,
            month: bm.month,
            month_label: bm.month_label,
            main: (&bm.main).into(),
            adu: (&bm.adu).into(),
        }
    }
}

impl From<&BillingYear> for BillingYearView {
    fn from(by: &BillingYear) -> Self {
        Self {
            start_month: by.start_month,
            start_year: by.start_year,
            num_months: by.num_months,
            months: by.months(),
            billing_months: by.billing_months.iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::codec::fixtures::sample_year_json;
    use crate::codec::{decode, decode_from_storage, encode_for_storage};

    fn view_json() -> Value {
        let by = decode(&sample_year_json()).unwrap();
        let view = decode_from_storage(&encode_for_storage(&by).unwrap()).unwrap();
        serde_json::to_value(view).unwrap()
    }

    #[test]
    fn tou_values_are_derived() {
        let json = view_json();
        let export = &json["billing_months"][0]["main"]["energy_export_meter_channel_2"];
        assert_eq!(export["peak"]["value"], json!(-113.825));
        assert_eq!(export["off_peak"]["value"], json!(-884.175));
        assert_eq!(export["total"]["value"], json!(-998.0));
        assert_eq!(export["peak"]["subcomponent_values"], json!([-113.825]));
    }

    #[test]
    fn multi_part_value_is_the_sum() {
        let json = view_json();
        let nem = &json["billing_months"][0]["main"]["pge_nem_billing"];
        assert_eq!(nem["subcomponent_values"], json!([12.5, -3.25]));
        assert_eq!(nem["value"], json!(9.25));
    }

    #[test]
    fn empty_metric_renders_null_value() {
        let json = view_json();
        let credit = &json["billing_months"][0]["main"]["pce_nem_credit"];
        assert_eq!(credit["subcomponent_values"], json!([]));
        assert_eq!(credit["value"], Value::Null);
    }

    #[test]
    fn meter_type_renders_canonical_literal() {
        let json = view_json();
        // The May meters were imported with the CamelCase literals.
        assert_eq!(
            json["billing_months"][0]["main"]["nem2a_meter_type"],
            json!("GENERATION_METER")
        );
        assert_eq!(
            json["billing_months"][0]["adu"]["nem2a_meter_type"],
            json!("BENEFIT_METER")
        );
    }

    #[test]
    fn meter_view_carries_every_canonical_field() {
        let json = view_json();
        let main = json["billing_months"][0]["main"].as_object().unwrap();
        for field in Field::all() {
            assert!(main.contains_key(field.name()), "missing {field}");
        }
        assert_eq!(main.len(), Field::COUNT + 1);
    }

    #[test]
    fn dates_render_value_or_null() {
        let json = view_json();
        assert_eq!(
            json["billing_months"][0]["main"]["billing_date"],
            json!({"value": "2024-05-14"})
        );
        assert_eq!(
            json["billing_months"][1]["adu"]["service_end_date"],
            json!({"value": null})
        );
    }

    #[test]
    fn months_and_labels_render_names() {
        let json = view_json();
        assert_eq!(
            json["months"],
            json!([
                {"month_name": "May", "year": 2024},
                {"month_name": "June", "year": 2024},
            ])
        );
        assert_eq!(
            json["billing_months"][1]["month_label"],
            json!({"month_name": "June", "year": 2024})
        );
    }

    #[test]
    fn view_json_decodes_back_to_the_same_record() {
        let original = decode(&sample_year_json()).unwrap();
        let again = decode(&view_json()).unwrap();
        assert_eq!(again, original);
    }
}
