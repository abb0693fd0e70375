use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};
use strum::IntoEnumIterator;

use super::model::{
    BillingMetadata, DateFieldMetadata, FieldDescriptor, FieldMetadata, FieldSource,
    MeterMetadata, SimpleFieldMetadata, TouFieldMetadata, Unit, WhereFrom,
};
use super::CatalogError;
use crate::schema::{Field, FieldCategory, MeterType};

/// Reads and validates a metadata source file.
pub fn load_file(path: &Path) -> Result<BillingMetadata, CatalogError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CatalogError::SourceNotFound {
                path: path.to_path_buf(),
            }
        } else {
            CatalogError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    parse_metadata(&text)
}

/// Parses the map-keyed metadata document and checks it against the schema
/// registry.
///
/// Structural problems are collected and reported together as
/// [`CatalogError::SchemaMismatch`]. An unknown unit or source literal is
/// reported as [`CatalogError::InvalidEnumValue`] once the structure is sound.
pub fn parse_metadata(text: &str) -> Result<BillingMetadata, CatalogError> {
    let root: Value = serde_json::from_str(text).map_err(|e| CatalogError::SchemaMismatch {
        details: vec![format!("malformed JSON: {e}")],
    })?;
    let Some(root) = root.as_object() else {
        return Err(CatalogError::SchemaMismatch {
            details: vec!["top level must be an object keyed by meter type".to_string()],
        });
    };

    let mut parser = Parser::default();
    parser.check_completeness(root);
    if !parser.details.is_empty() {
        return Err(CatalogError::SchemaMismatch {
            details: parser.details,
        });
    }

    let generation_meter = parser.meter(root, MeterType::Generation);
    let benefit_meter = parser.meter(root, MeterType::Benefit);

    if !parser.details.is_empty() {
        return Err(CatalogError::SchemaMismatch {
            details: parser.details,
        });
    }
    if let Some(err) = parser.invalid_enum {
        return Err(err);
    }

    match (generation_meter, benefit_meter) {
        (Some(generation_meter), Some(benefit_meter)) => Ok(BillingMetadata {
            generation_meter,
            benefit_meter,
        }),
        _ => Err(CatalogError::SchemaMismatch {
            details: vec!["metadata could not be parsed".to_string()],
        }),
    }
}

/// Shape-based classification of a field entry.
fn infer_category(obj: &Map<String, Value>) -> FieldCategory {
    if obj.contains_key("peak") && obj.contains_key("off_peak") && obj.contains_key("total") {
        FieldCategory::TimeOfUse
    } else if obj.contains_key("unit") {
        FieldCategory::Simple
    } else {
        FieldCategory::Date
    }
}

#[derive(Default)]
struct Parser {
    details: Vec<String>,
    invalid_enum: Option<CatalogError>,
}

impl Parser {
    fn check_completeness(&mut self, root: &Map<String, Value>) {
        for key in root.keys() {
            if MeterType::from_catalog_key(key).is_none() {
                self.details.push(format!("unknown meter type: {key}"));
            }
        }

        for meter_type in MeterType::iter() {
            let key = meter_type.catalog_key();
            let Some(meter) = root.get(key) else {
                self.details.push(format!("missing meter type: {key}"));
                continue;
            };
            let Some(meter) = meter.as_object() else {
                self.details.push(format!("{key} must be an object keyed by field name"));
                continue;
            };

            let missing: Vec<&str> = Field::all()
                .map(Field::name)
                .filter(|name| !meter.contains_key(*name))
                .collect();
            let extra: Vec<&str> = meter
                .keys()
                .map(String::as_str)
                .filter(|name| Field::from_name(name).is_none())
                .collect();

            if !missing.is_empty() {
                self.details.push(format!(
                    "{key} missing metadata for fields: {}",
                    missing.join(", ")
                ));
            }
            if !extra.is_empty() {
                self.details.push(format!(
                    "{key} has metadata for unknown fields: {}",
                    extra.join(", ")
                ));
            }
        }
    }

    fn meter(&mut self, root: &Map<String, Value>, meter_type: MeterType) -> Option<MeterMetadata> {
        let key = meter_type.catalog_key();
        let meter = root.get(key)?.as_object()?;

        let mut fields = BTreeMap::new();
        for field in Field::all() {
            let path = format!("{key}.{}", field.name());
            let Some(value) = meter.get(field.name()) else {
                continue;
            };
            if let Some(metadata) = self.field(value, field, &path) {
                fields.insert(field, FieldDescriptor { metadata });
            }
        }

        (fields.len() == Field::COUNT).then_some(MeterMetadata { fields })
    }

    fn field(&mut self, value: &Value, field: Field, path: &str) -> Option<FieldMetadata> {
        let Some(obj) = value.as_object() else {
            self.details.push(format!("{path}: expected an object"));
            return None;
        };

        let inferred = infer_category(obj);
        if inferred != field.category() {
            self.details.push(format!(
                "{path}: metadata has {} shape but the field is {}",
                inferred.as_str(),
                field.category().as_str()
            ));
            return None;
        }

        match inferred {
            FieldCategory::Date => Some(FieldMetadata::DateField(DateFieldMetadata {
                where_found: self.where_found(obj, path)?,
            })),
            FieldCategory::Simple => self.simple(obj, path).map(FieldMetadata::SimpleField),
            FieldCategory::TimeOfUse => {
                let [peak, off_peak, total] = ["peak", "off_peak", "total"].map(|slot| {
                    let slot_path = format!("{path}.{slot}");
                    match obj.get(slot).and_then(Value::as_object) {
                        Some(slot_obj) => self.simple(slot_obj, &slot_path),
                        None => {
                            self.details.push(format!("{slot_path}: expected an object"));
                            None
                        }
                    }
                });
                Some(FieldMetadata::TouField(TouFieldMetadata {
                    peak: peak?,
                    off_peak: off_peak?,
                    total: total?,
                }))
            }
        }
    }

    fn simple(&mut self, obj: &Map<String, Value>, path: &str) -> Option<SimpleFieldMetadata> {
        let unit = self.enum_value::<Unit>(obj.get("unit"), &format!("{path}.unit"));
        let where_found = self.where_found(obj, path);
        Some(SimpleFieldMetadata {
            unit: unit?,
            where_found: where_found?,
        })
    }

    fn where_found(&mut self, obj: &Map<String, Value>, path: &str) -> Option<Vec<FieldSource>> {
        let list_path = format!("{path}.where_found");
        let Some(items) = obj.get("where_found").and_then(Value::as_array) else {
            self.details.push(format!("{list_path}: expected a list of sources"));
            return None;
        };
        if items.is_empty() {
            self.details.push(format!("{list_path}: at least one source is required"));
            return None;
        }

        let parsed: Vec<Option<FieldSource>> = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.source(item, &format!("{list_path}[{i}]")))
            .collect();
        parsed.into_iter().collect()
    }

    fn source(&mut self, value: &Value, path: &str) -> Option<FieldSource> {
        let Some(obj) = value.as_object() else {
            self.details.push(format!("{path}: expected an object"));
            return None;
        };

        let where_from =
            self.enum_value::<WhereFrom>(obj.get("where_from"), &format!("{path}.where_from"));

        let where_on_pdf = match obj.get("where_on_pdf") {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(_) => {
                self.details
                    .push(format!("{path}.where_on_pdf: expected a string"));
                None
            }
        };

        let kevins_number_code = match obj.get("kevins_number_code") {
            None | Some(Value::Null) => Some(None),
            Some(v) => match v.as_i64().and_then(|n| i32::try_from(n).ok()) {
                Some(n) => Some(Some(n)),
                None => {
                    self.details
                        .push(format!("{path}.kevins_number_code: expected a 32-bit integer"));
                    None
                }
            },
        };

        Some(FieldSource {
            where_from: where_from?,
            where_on_pdf: where_on_pdf?,
            kevins_number_code: kevins_number_code?,
        })
    }

    fn enum_value<E>(&mut self, value: Option<&Value>, path: &str) -> Option<E>
    where
        E: std::str::FromStr + IntoEnumIterator + Into<&'static str>,
    {
        let Some(value) = value else {
            self.details.push(format!("{path}: missing"));
            return None;
        };
        let Some(literal) = value.as_str() else {
            self.details.push(format!("{path}: expected a string"));
            return None;
        };
        match literal.parse::<E>() {
            Ok(v) => Some(v),
            Err(_) => {
                if self.invalid_enum.is_none() {
                    self.invalid_enum = Some(CatalogError::InvalidEnumValue {
                        path: path.to_string(),
                        value: literal.to_string(),
                        expected: E::iter().map(Into::into).collect(),
                    });
                }
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn source(where_from: &str) -> Value {
        json!({ "where_from": where_from, "where_on_pdf": "Page 1", "kevins_number_code": 7 })
    }

    fn field_json(field: Field) -> Value {
        let simple = |unit: &str| json!({ "unit": unit, "where_found": [source("PDF_BILL")] });
        match field.category() {
            FieldCategory::Date => json!({ "where_found": [source("PDF_BILL")] }),
            FieldCategory::Simple => simple("DOLLARS"),
            FieldCategory::TimeOfUse => json!({
                "peak": simple("KILOWATT_HOURS"),
                "off_peak": simple("KILOWATT_HOURS"),
                "total": { "unit": "KILOWATT_HOURS", "where_found": [
                    { "where_from": "CALCULATED" }
                ] },
            }),
        }
    }

    /// A complete, valid metadata document.
    pub(crate) fn metadata_json() -> Value {
        let meter: serde_json::Map<String, Value> = Field::all()
            .map(|f| (f.name().to_string(), field_json(f)))
            .collect();
        json!({ "generation_meter": meter.clone(), "benefit_meter": meter })
    }

    fn parse(value: &Value) -> Result<BillingMetadata, CatalogError> {
        parse_metadata(&value.to_string())
    }

    fn mismatch_details(value: &Value) -> Vec<String> {
        match parse(value) {
            Err(CatalogError::SchemaMismatch { details }) => details,
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn parses_complete_document_with_tagged_variants() {
        let md = parse(&metadata_json()).unwrap();
        for meter_type in MeterType::iter() {
            let meter = md.meter(meter_type);
            assert_eq!(meter.fields.len(), Field::COUNT);
            for field in Field::all() {
                assert_eq!(meter.field(field).unwrap().category(), field.category());
            }
        }

        let Some(FieldMetadata::TouField(tou)) = md.generation_meter.field(Field::PceEnergyCost)
        else {
            panic!("pce_energy_cost should be time-of-use");
        };
        assert_eq!(tou.peak.unit, Unit::KilowattHours);
        assert_eq!(tou.total.where_found[0].where_from, WhereFrom::Calculated);
        assert_eq!(tou.total.where_found[0].where_on_pdf, None);
        assert_eq!(tou.total.where_found[0].kevins_number_code, None);
        assert_eq!(tou.peak.where_found[0].kevins_number_code, Some(7));
    }

    #[test]
    fn missing_field_is_named() {
        let mut doc = metadata_json();
        doc["benefit_meter"]
            .as_object_mut()
            .unwrap()
            .remove("pge_baseline_credit");
        let details = mismatch_details(&doc);
        assert_eq!(
            details,
            vec!["benefit_meter missing metadata for fields: pge_baseline_credit".to_string()]
        );
    }

    #[test]
    fn extra_field_and_meter_are_named() {
        let mut doc = metadata_json();
        doc["generation_meter"]["bogus_field"] = json!({ "where_found": [] });
        doc["solar_meter"] = json!({});
        let details = mismatch_details(&doc);
        assert!(details.contains(&"unknown meter type: solar_meter".to_string()));
        assert!(details
            .contains(&"generation_meter has metadata for unknown fields: bogus_field".to_string()));
    }

    #[test]
    fn missing_meter_type_is_reported() {
        let mut doc = metadata_json();
        doc.as_object_mut().unwrap().remove("generation_meter");
        let details = mismatch_details(&doc);
        assert_eq!(details, vec!["missing meter type: generation_meter".to_string()]);
    }

    #[test]
    fn shape_disagreeing_with_registry_is_a_mismatch() {
        let mut doc = metadata_json();
        doc["generation_meter"]["total_bill_in_mail"] = json!({
            "peak": { "unit": "DOLLARS", "where_found": [source("PDF_BILL")] },
            "off_peak": { "unit": "DOLLARS", "where_found": [source("PDF_BILL")] },
            "total": { "unit": "DOLLARS", "where_found": [source("PDF_BILL")] },
        });
        doc["benefit_meter"]["billing_date"] =
            json!({ "unit": "DOLLARS", "where_found": [source("PDF_BILL")] });
        let details = mismatch_details(&doc);
        assert_eq!(details.len(), 2);
        assert!(details[0].starts_with("generation_meter.total_bill_in_mail"));
        assert!(details[1].starts_with("benefit_meter.billing_date"));
    }

    #[test]
    fn empty_where_found_is_a_mismatch() {
        let mut doc = metadata_json();
        doc["generation_meter"]["pce_nem_credit"]["where_found"] = json!([]);
        let details = mismatch_details(&doc);
        assert_eq!(
            details,
            vec!["generation_meter.pce_nem_credit.where_found: at least one source is required"
                .to_string()]
        );
    }

    #[test]
    fn unknown_unit_is_invalid_enum() {
        let mut doc = metadata_json();
        doc["benefit_meter"]["pce_nem_credit"]["unit"] = json!("EUROS");
        match parse(&doc) {
            Err(CatalogError::InvalidEnumValue {
                path,
                value,
                expected,
            }) => {
                assert_eq!(path, "benefit_meter.pce_nem_credit.unit");
                assert_eq!(value, "EUROS");
                assert_eq!(expected, vec!["KILOWATT_HOURS", "DOLLARS"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_where_from_is_invalid_enum() {
        let mut doc = metadata_json();
        doc["generation_meter"]["billing_date"]["where_found"][0]["where_from"] =
            json!("EMAIL");
        let err = parse(&doc).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidEnumValue { ref value, .. } if value == "EMAIL"));
    }

    #[test]
    fn malformed_json_is_a_mismatch() {
        let err = parse_metadata("{ nope").unwrap_err();
        assert!(matches!(err, CatalogError::SchemaMismatch { .. }));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CatalogError::SourceNotFound { .. }));
    }
}
