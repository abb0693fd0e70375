use std::collections::BTreeMap;

use serde_json::{Map, Value};
use time::macros::format_description;

use super::{CodecError, ValidationReport};
use crate::domain::{
    month_labels, BillingMonth, BillingYear, Metric, MeterMetrics, MeterRecord, MetricValue,
    MonthLabel, TouMetric, MONTH_NAMES,
};
use crate::domain::billing_year::MAX_NUM_MONTHS;
use crate::schema::{Field, FieldCategory, MeterType, RECORD_METER_LITERALS};

const METER_TYPE_KEY: &str = "nem2a_meter_type";
const TOU_SLOTS: [&str; 3] = ["peak", "off_peak", "total"];

/// Parses and validates an external record given as JSON text.
pub fn decode_str(text: &str) -> Result<BillingYear, CodecError> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => decode(&value),
        Err(e) => {
            let mut report = ValidationReport::default();
            report.push("$", format!("malformed JSON: {e}"));
            Err(CodecError::Validation(report))
        }
    }
}

/// Validates an external record and builds the domain value.
///
/// Does not stop at the first problem: the returned report lists every
/// missing or malformed field.
pub fn decode(external: &Value) -> Result<BillingYear, CodecError> {
    let mut report = ValidationReport::default();
    let decoded = Decoder {
        report: &mut report,
    }
    .billing_year(external);

    match decoded {
        Some(by) if report.is_empty() => Ok(by),
        _ => {
            if report.is_empty() {
                report.push("$", "record could not be decoded");
            }
            Err(CodecError::Validation(report))
        }
    }
}

fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

struct Decoder<'r> {
    report: &'r mut ValidationReport,
}

impl Decoder<'_> {
    fn object<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
        match value.as_object() {
            Some(obj) => Some(obj),
            None => {
                let at = if path.is_empty() { "$" } else { path };
                self.report
                    .push(at, format!("expected an object, found {}", describe(value)));
                None
            }
        }
    }

    fn required<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'v Value> {
        let found = obj.get(key);
        if found.is_none() {
            self.report.push(child(path, key), "missing required field");
        }
        found
    }

    fn integer(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<i64> {
        let value = self.required(obj, key, path)?;
        match value.as_i64() {
            Some(n) => Some(n),
            None => {
                self.report.push(
                    child(path, key),
                    format!("expected an integer, found {}", describe(value)),
                );
                None
            }
        }
    }

    fn integer_in<T: TryFrom<i64>>(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        path: &str,
        lo: i64,
        hi: i64,
    ) -> Option<T> {
        let n = self.integer(obj, key, path)?;
        if n < lo || n > hi {
            self.report
                .push(child(path, key), format!("{n} outside {lo}..={hi}"));
            return None;
        }
        T::try_from(n).ok()
    }

    fn year(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<i32> {
        self.integer_in(obj, key, path, i64::from(i32::MIN), i64::from(i32::MAX))
    }

    fn billing_year(&mut self, value: &Value) -> Option<BillingYear> {
        let root = self.object(value, "")?;

        let start_month: Option<u8> = self.integer_in(root, "start_month", "", 1, 12);
        let start_year = self.year(root, "start_year", "");
        let num_months: Option<u32> =
            self.integer_in(root, "num_months", "", 1, i64::from(MAX_NUM_MONTHS));

        if let (Some(months), Some(sm), Some(sy), Some(nm)) =
            (root.get("months"), start_month, start_year, num_months)
        {
            self.check_months(months, sm, sy, nm);
        }

        let billing_months = self
            .required(root, "billing_months", "")
            .and_then(|v| self.billing_months(v));

        if let (Some(bms), Some(nm)) = (&billing_months, num_months) {
            if bms.len() as u64 > u64::from(nm) {
                self.report.push(
                    "billing_months",
                    format!("{} entries exceed num_months {nm}", bms.len()),
                );
            }
        }

        Some(BillingYear {
            start_month: start_month?,
            start_year: start_year?,
            num_months: num_months?,
            billing_months: billing_months?,
        })
    }

    /// `months` is derived data; when supplied it must agree with the window.
    fn check_months(&mut self, months: &Value, start_month: u8, start_year: i32, num_months: u32) {
        let supplied: Vec<MonthLabel> = match serde_json::from_value(months.clone()) {
            Ok(v) => v,
            Err(e) => {
                self.report.push("months", format!("malformed month labels: {e}"));
                return;
            }
        };
        if supplied != month_labels(start_month, start_year, num_months) {
            self.report.push(
                "months",
                format!(
                    "does not match the {num_months} month(s) starting {} {start_year}",
                    MONTH_NAMES[usize::from(start_month) - 1]
                ),
            );
        }
    }

    fn billing_months(&mut self, value: &Value) -> Option<Vec<BillingMonth>> {
        let Some(items) = value.as_array() else {
            self.report.push(
                "billing_months",
                format!("expected an array, found {}", describe(value)),
            );
            return None;
        };

        // Decode every entry before giving up so all violations are reported.
        let decoded: Vec<Option<BillingMonth>> = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.billing_month(item, &format!("billing_months[{i}]")))
            .collect();
        decoded.into_iter().collect()
    }

    fn billing_month(&mut self, value: &Value, path: &str) -> Option<BillingMonth> {
        let obj = self.object(value, path)?;

        let year = self.year(obj, "year", path);
        let month: Option<u8> = self.integer_in(obj, "month", path, 1, 12);
        let month_label = self
            .required(obj, "month_label", path)
            .and_then(|v| self.month_label(v, &child(path, "month_label")));
        let main = self
            .required(obj, "main", path)
            .and_then(|v| self.meter(v, &child(path, "main")));
        let adu = self
            .required(obj, "adu", path)
            .and_then(|v| self.meter(v, &child(path, "adu")));

        Some(BillingMonth {
            year: year?,
            month: month?,
            month_label: month_label?,
            main: main?,
            adu: adu?,
        })
    }

    fn month_label(&mut self, value: &Value, path: &str) -> Option<MonthLabel> {
        let obj = self.object(value, path)?;
        let year = self.year(obj, "year", path);
        let name_path = child(path, "month_name");
        let month = match self.required(obj, "month_name", path)? {
            Value::String(name) => match MonthLabel::parse_month_name(name) {
                Some(m) => Some(m),
                None => {
                    self.report
                        .push(name_path, format!("\"{name}\" is not a month name"));
                    None
                }
            },
            other => {
                self.report.push(
                    name_path,
                    format!("expected a string, found {}", describe(other)),
                );
                None
            }
        };
        Some(MonthLabel::new(month?, year?))
    }

    fn meter(&mut self, value: &Value, path: &str) -> Option<MeterRecord> {
        let obj = self.object(value, path)?;

        for key in obj.keys() {
            if key != METER_TYPE_KEY && Field::from_name(key).is_none() {
                self.report.push(child(path, key), "unknown field");
            }
        }

        let meter_type = self
            .required(obj, METER_TYPE_KEY, path)
            .and_then(|v| self.meter_type(v, &child(path, METER_TYPE_KEY)));

        let billing_date = self.date(obj, Field::BillingDate, path);
        let service_end_date = self.date(obj, Field::ServiceEndDate, path);

        let mut values = BTreeMap::new();
        let mut complete = true;
        for field in Field::metric_fields() {
            let field_path = child(path, field.name());
            let decoded = self.required(obj, field.name(), path).and_then(|v| {
                match field.category() {
                    FieldCategory::TimeOfUse => {
                        self.tou_metric(v, &field_path).map(MetricValue::TimeOfUse)
                    }
                    _ => self.metric(v, &field_path).map(MetricValue::Simple),
                }
            });
            match decoded {
                Some(v) => {
                    values.insert(field, v);
                }
                None => complete = false,
            }
        }

        let metrics = if complete {
            match MeterMetrics::from_map(values) {
                Ok(m) => Some(m),
                Err(problems) => {
                    for p in problems {
                        self.report.push(path, p);
                    }
                    None
                }
            }
        } else {
            None
        };

        Some(MeterRecord {
            meter_type: meter_type?,
            billing_date: billing_date?,
            service_end_date: service_end_date?,
            metrics: metrics?,
        })
    }

    fn meter_type(&mut self, value: &Value, path: &str) -> Option<MeterType> {
        let parsed = value.as_str().and_then(MeterType::from_record_literal);
        if parsed.is_none() {
            self.report.push(
                path,
                format!(
                    "invalid meter type {value}, expected one of {}",
                    RECORD_METER_LITERALS.join(", ")
                ),
            );
        }
        parsed
    }

    /// Outer `None` means invalid; `Some(None)` is an absent date.
    fn date(
        &mut self,
        obj: &Map<String, Value>,
        field: Field,
        path: &str,
    ) -> Option<Option<String>> {
        let field_path = child(path, field.name());
        let raw = self.required(obj, field.name(), path)?;
        let inner = self.object(raw, &field_path)?;
        let value_path = child(&field_path, "value");
        match inner.get("value") {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) if s.is_empty() => Some(None),
            Some(Value::String(s)) => {
                let format = format_description!("[year]-[month]-[day]");
                match time::Date::parse(s, &format) {
                    Ok(_) => Some(Some(s.clone())),
                    Err(e) => {
                        self.report
                            .push(value_path, format!("\"{s}\" is not a YYYY-MM-DD date: {e}"));
                        None
                    }
                }
            }
            Some(other) => {
                self.report.push(
                    value_path,
                    format!("expected a string or null, found {}", describe(other)),
                );
                None
            }
        }
    }

    fn tou_metric(&mut self, value: &Value, path: &str) -> Option<TouMetric> {
        let obj = self.object(value, path)?;
        let [peak, off_peak, total] = TOU_SLOTS.map(|slot| {
            self.required(obj, slot, path)
                .and_then(|v| self.metric(v, &child(path, slot)))
        });
        Some(TouMetric {
            peak: peak?,
            off_peak: off_peak?,
            total: total?,
        })
    }

    /// A `value` key, if present, is derived data and is ignored.
    fn metric(&mut self, value: &Value, path: &str) -> Option<Metric> {
        let obj = self.object(value, path)?;
        let list_path = child(path, "subcomponent_values");
        match self.required(obj, "subcomponent_values", path)? {
            Value::Null => Some(Metric::default()),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                let mut ok = true;
                for (i, item) in items.iter().enumerate() {
                    match item.as_f64() {
                        Some(n) => out.push(n),
                        None => {
                            ok = false;
                            self.report.push(
                                format!("{list_path}[{i}]"),
                                format!("expected a number, found {}", describe(item)),
                            );
                        }
                    }
                }
                if !ok {
                    return None;
                }
                let metric = Metric::new(out);
                if !metric.is_finite() {
                    self.report
                        .push(list_path, "sum of subcomponent values is not finite");
                    return None;
                }
                Some(metric)
            }
            other => {
                self.report.push(
                    list_path,
                    format!("expected an array or null, found {}", describe(other)),
                );
                None
            }
        }
    }
}
