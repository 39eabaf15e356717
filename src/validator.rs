// src/validator.rs - Centralized validation module
use std::collections::BTreeMap;
use std::str::FromStr;
use serde::Serialize;
use serde_json::{Map, Value};
use regex::Regex;
use lazy_static::lazy_static;
use chrono::NaiveDate;
use validator::Validate;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    FieldKind, FieldSpec, FieldValue, Gender, KitRequest, PatientRequest, ResultEntry,
    ResultKind, ResultPayload,
};

lazy_static! {
    static ref NUMERIC_REGEX: Regex =
        Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$").unwrap();
}

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Keys the client may echo back from a read that are owned by the store.
const SYSTEM_KEYS: &[&str] = &["id", "kind", "created_at", "updated_at"];

// ==================== VALIDATION RESULT ====================

#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct ValidationResult {
    pub errors: BTreeMap<String, Vec<String>>,
    pub warnings: BTreeMap<String, Vec<String>>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_validator(err: &validator::ValidationErrors) -> Self {
        let mut result = Self::new();
        for (field, errors) in err.field_errors() {
            for error in errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                result.add_error(field.to_string(), message);
            }
        }
        result
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        for (field, errors) in other.errors {
            self.errors.entry(field).or_default().extend(errors);
        }
        for (field, warnings) in other.warnings {
            self.warnings.entry(field).or_default().extend(warnings);
        }
    }

    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|(field, errors)| format!("{}: {}", field, errors.join(", ")))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn to_api_error(&self) -> ApiError {
        ApiError::ValidationError(self.clone())
    }
}

// ==================== FIELD VALIDATORS ====================

pub struct FieldValidator;

impl FieldValidator {
    pub fn not_empty(value: &str, field: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            Err(format!("The {} field is required", field))
        } else {
            Ok(())
        }
    }

    pub fn date(value: &str, field: &str) -> Result<NaiveDate, String> {
        NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
            .map_err(|_| format!("The {} field must be a valid date (YYYY-MM-DD)", field))
    }

    /// Loose numeric check: integers, decimals and exponents, surrounding whitespace allowed.
    pub fn is_numeric(value: &str) -> bool {
        NUMERIC_REGEX.is_match(value)
    }

    pub fn numeric_value(value: &str) -> Option<f64> {
        if Self::is_numeric(value) {
            value.trim().parse::<f64>().ok()
        } else {
            None
        }
    }
}

// ==================== PATIENT / KIT ====================

/// Runs the derive-based rules, keeping the first complaint per field.
fn check_rules(request: &impl Validate, result: &mut ValidationResult) {
    if let Err(e) = request.validate() {
        for (field, messages) in ValidationResult::from_validator(&e).errors {
            if !result.has_error(&field) {
                result.errors.insert(field, messages);
            }
        }
    }
}

/// Checks a raw registration body. Type and format problems are reported per field
/// instead of failing the whole body.
pub fn validate_patient(input: &Map<String, Value>) -> ApiResult<PatientRequest> {
    let mut result = ValidationResult::new();
    let mut request = PatientRequest {
        name: universal_text(input, "name", &mut result).unwrap_or_default(),
        date_of_birth: universal_date(input, "date_of_birth", &mut result),
        gender: universal_text(input, "gender", &mut result).unwrap_or_default(),
        company: universal_text(input, "company", &mut result),
        address: universal_text(input, "address", &mut result),
    };
    check_rules(&request, &mut result);

    if !result.has_error("gender") {
        if let Err(message) = FieldValidator::not_empty(&request.gender, "gender") {
            result.add_error("gender", message);
        } else {
            match Gender::from_str(&request.gender) {
                Ok(gender) => request.gender = gender.to_string(),
                Err(_) => result.add_error("gender", "The gender field must be Male or Female"),
            }
        }
    }

    if result.is_valid() {
        Ok(request)
    } else {
        Err(result.to_api_error())
    }
}

pub fn validate_kit(input: &Map<String, Value>) -> ApiResult<KitRequest> {
    let mut result = ValidationResult::new();
    let request = KitRequest {
        kit_name: universal_text(input, "kit_name", &mut result).unwrap_or_default(),
        kit_types: universal_text(input, "kit_types", &mut result),
        kit_lot_no: universal_text(input, "kit_lot_no", &mut result),
        kit_expiration_date: universal_date(input, "kit_expiration_date", &mut result),
    };
    check_rules(&request, &mut result);

    if result.is_valid() {
        Ok(request)
    } else {
        Err(result.to_api_error())
    }
}

// ==================== RESULT PAYLOADS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Regular create/update: `kit_id` links serology, legacy kit metadata is ignored.
    Standard,
    /// Migration of legacy serology rows: legacy kit metadata accepted, `kit_id` optional.
    Import,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPayload {
    pub payload: ResultPayload,
    pub warnings: BTreeMap<String, Vec<String>>,
}

/// Checks a raw field map against the schema of `kind`.
///
/// Either every field is accepted and normalized, or the full set of
/// field-level errors is returned. Nothing is partially applied.
pub fn validate_result_payload(
    kind: ResultKind,
    input: &Map<String, Value>,
    mode: ValidationMode,
) -> Result<ValidatedPayload, ValidationResult> {
    let mut result = ValidationResult::new();

    let patient_id = universal_text(input, "patient_id", &mut result);
    if patient_id.is_none() && !result.has_error("patient_id") {
        result.add_error("patient_id", "The patient_id field is required");
    }

    let medical_technologist = universal_text(input, "medical_technologist", &mut result);
    if kind.requires_technologist()
        && medical_technologist.is_none()
        && !result.has_error("medical_technologist")
    {
        result.add_error("medical_technologist", "The medical_technologist field is required");
    }

    let kit_id = if kind.links_kit() {
        let kit_id = universal_text(input, "kit_id", &mut result);
        if kit_id.is_none() && mode == ValidationMode::Standard && !result.has_error("kit_id") {
            result.add_error("kit_id", "The kit_id field is required");
        }
        kit_id
    } else {
        if input.get("kit_id").map_or(false, |v| !v.is_null()) {
            result.add_warning("kit_id", format!("kit_id is not used by {} results and was ignored", kind));
        }
        None
    };

    let reported_at = match input.get("reported_at") {
        None => None,
        Some(raw) => match normalize_field(&REPORTED_AT, raw) {
            Ok(Some(FieldValue::Date(d))) => Some(d),
            Ok(_) => None,
            Err(errors) => {
                for (key, message) in errors {
                    result.add_error(key, message);
                }
                None
            }
        },
    };

    let mut fields = BTreeMap::new();
    for spec in kind.schema() {
        let raw = match (input.get(spec.name), spec.alias.and_then(|a| input.get(a))) {
            (Some(value), Some(_)) => {
                if let Some(alias) = spec.alias {
                    result.add_warning(alias, format!("{} was given; {} takes precedence", alias, spec.name));
                }
                value
            }
            (Some(value), None) | (None, Some(value)) => value,
            (None, None) => continue,
        };

        if spec.legacy && mode == ValidationMode::Standard {
            if !raw.is_null() {
                result.add_warning(
                    spec.name,
                    "Per-panel kit metadata is accepted only by the import route; link the kit through kit_id",
                );
            }
            continue;
        }

        match normalize_field(spec, raw) {
            Ok(Some(value)) => {
                fields.insert(spec.name.to_string(), value);
            }
            Ok(None) => {}
            Err(errors) => {
                for (key, message) in errors {
                    result.add_error(key, message);
                }
            }
        }
    }

    for key in input.keys() {
        if !is_known_key(kind, key) {
            result.add_warning(key.as_str(), "Unknown field ignored");
        }
    }

    match (result.is_valid(), patient_id) {
        (true, Some(patient_id)) => Ok(ValidatedPayload {
            payload: ResultPayload {
                patient_id,
                kit_id,
                medical_technologist,
                reported_at,
                fields,
            },
            warnings: result.warnings,
        }),
        _ => Err(result),
    }
}

const REPORTED_AT: FieldSpec = FieldSpec {
    name: "reported_at",
    kind: FieldKind::Date,
    legacy: false,
    alias: None,
};

fn is_known_key(kind: ResultKind, key: &str) -> bool {
    matches!(key, "patient_id" | "medical_technologist" | "kit_id" | "reported_at")
        || SYSTEM_KEYS.contains(&key)
        || kind
            .schema()
            .iter()
            .any(|spec| spec.name == key || spec.alias == Some(key))
}

fn universal_date(input: &Map<String, Value>, field: &str, result: &mut ValidationResult) -> Option<NaiveDate> {
    match input.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => match FieldValidator::date(s, field) {
            Ok(date) => Some(date),
            Err(message) => {
                result.add_error(field, message);
                None
            }
        },
        Some(_) => {
            result.add_error(field, format!("The {} field must be a date string", field));
            None
        }
    }
}

fn universal_text(input: &Map<String, Value>, field: &str, result: &mut ValidationResult) -> Option<String> {
    match input.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(_) => {
            result.add_error(field, format!("The {} field must be a string", field));
            None
        }
    }
}

/// Normalizes one raw value against its field spec.
///
/// Used both on incoming payloads and on values read back from storage, so a
/// stored record is only ever surfaced in a shape the schema accepts.
pub fn normalize_field(spec: &FieldSpec, raw: &Value) -> Result<Option<FieldValue>, Vec<(String, String)>> {
    let name = spec.name;
    let type_error = |expected: &str| vec![(name.to_string(), format!("The {} field must be {}", name, expected))];

    match (spec.kind, raw) {
        (_, Value::Null) => Ok(None),

        (FieldKind::Text, Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| FieldValue::Text(s.to_string())))
        }
        (FieldKind::Text, _) => Err(type_error("a string")),

        (FieldKind::Date, Value::String(s)) if s.trim().is_empty() => Ok(None),
        (FieldKind::Date, Value::String(s)) => FieldValidator::date(s, name)
            .map(|d| Some(FieldValue::Date(d)))
            .map_err(|message| vec![(name.to_string(), message)]),
        (FieldKind::Date, _) => Err(type_error("a date string")),

        (FieldKind::Entries, Value::Array(items)) => normalize_entries(name, items).map(|e| Some(FieldValue::Entries(e))),
        (FieldKind::Entries, _) => Err(type_error("an array")),

        (FieldKind::Values, Value::Array(items)) => Ok(Some(FieldValue::Values(items.clone()))),
        (FieldKind::Values, _) => Err(type_error("an array")),

        (FieldKind::SingleResult, Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| FieldValue::List(vec![s.to_string()])))
        }
        (FieldKind::SingleResult, Value::Array(items)) => match items.as_slice() {
            [] => Ok(Some(FieldValue::List(Vec::new()))),
            [Value::String(s)] => Ok(Some(FieldValue::List(vec![s.trim().to_string()]))),
            [_] => Err(vec![(format!("{}.0", name), format!("The {}.0 field must be a string", name))]),
            _ => Err(type_error("a single result")),
        },
        (FieldKind::SingleResult, _) => Err(type_error("a string or a single-element array")),
    }
}

fn normalize_entries(name: &str, items: &[Value]) -> Result<Vec<ResultEntry>, Vec<(String, String)>> {
    let mut entries = Vec::with_capacity(items.len());
    let mut errors = Vec::new();

    for (i, item) in items.iter().enumerate() {
        let Value::Object(obj) = item else {
            errors.push((format!("{}.{}", name, i), format!("The {}.{} field must be an object", name, i)));
            continue;
        };

        let type_key = format!("{}.{}.type", name, i);
        let entry_type = match obj.get("type") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::String(_)) | Some(Value::Null) | None => {
                errors.push((type_key.clone(), format!("The {} field is required", type_key)));
                None
            }
            Some(_) => {
                errors.push((type_key.clone(), format!("The {} field must be a string", type_key)));
                None
            }
        };

        let details_key = format!("{}.{}.details", name, i);
        let details = match obj.get("details") {
            None | Some(Value::Null) => None,
            Some(Value::Array(values)) => {
                let mut details = Vec::with_capacity(values.len());
                for (j, value) in values.iter().enumerate() {
                    match value {
                        Value::String(s) => details.push(s.trim().to_string()),
                        _ => errors.push((
                            format!("{}.{}", details_key, j),
                            format!("The {}.{} field must be a string", details_key, j),
                        )),
                    }
                }
                Some(details)
            }
            Some(_) => {
                errors.push((details_key.clone(), format!("The {} field must be an array", details_key)));
                None
            }
        };

        if let Some(entry_type) = entry_type {
            entries.push(ResultEntry { entry_type, details });
        }
    }

    if errors.is_empty() {
        Ok(entries)
    } else {
        Err(errors)
    }
}
