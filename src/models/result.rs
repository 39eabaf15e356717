// src/models/result.rs
//! Result records for the four test categories.
//!
//! All categories share one record shape; what differs is the schema table
//! returned by [`ResultKind::schema`], which the validator, the repository and
//! the report projection all dispatch on.

use std::collections::BTreeMap;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

// ==================== KIND ====================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    EnumString, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResultKind {
    Clinical,
    Hematology,
    Serology,
    Chemistry,
}

impl ResultKind {
    pub fn table_name(&self) -> &'static str {
        match self {
            ResultKind::Clinical => "clinical_results",
            ResultKind::Hematology => "hematology_results",
            ResultKind::Serology => "serology_results",
            ResultKind::Chemistry => "chemistry_results",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResultKind::Clinical => "Clinical microscopy",
            ResultKind::Hematology => "Hematology",
            ResultKind::Serology => "Serology",
            ResultKind::Chemistry => "Chemistry",
        }
    }

    pub fn schema(&self) -> &'static [FieldSpec] {
        match self {
            ResultKind::Clinical => CLINICAL_FIELDS,
            ResultKind::Hematology => HEMATOLOGY_FIELDS,
            ResultKind::Serology => SEROLOGY_FIELDS,
            ResultKind::Chemistry => CHEMISTRY_FIELDS,
        }
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.schema().iter().find(|f| f.name == name)
    }

    /// Serology signs off without a named technologist; every other category requires one.
    pub fn requires_technologist(&self) -> bool {
        !matches!(self, ResultKind::Serology)
    }

    pub fn links_kit(&self) -> bool {
        matches!(self, ResultKind::Serology)
    }
}

// ==================== SCHEMA ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Opaque string, stored as entered.
    Text,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// Sequence of `{type, details}` entries.
    Entries,
    /// Sequence of arbitrary JSON values.
    Values,
    /// At most one string result; a bare string is accepted and wrapped.
    SingleResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Superseded per-panel kit metadata; only the import path writes it.
    pub legacy: bool,
    /// Alternate input key accepted for this field.
    pub alias: Option<&'static str>,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, legacy: false, alias: None }
    }

    const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    const fn entries(name: &'static str) -> Self {
        Self::new(name, FieldKind::Entries)
    }

    const fn legacy(self) -> Self {
        Self { legacy: true, ..self }
    }

    const fn alias(self, alias: &'static str) -> Self {
        Self { alias: Some(alias), ..self }
    }
}

pub const CLINICAL_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("fecalysis_color"),
    FieldSpec::text("fecalysis_consistency"),
    FieldSpec::text("fecalysis_wbc"),
    FieldSpec::text("fecalysis_rbc"),
    FieldSpec::text("fecalysis_results"),
    FieldSpec::text("fecalysis_remarks"),
    FieldSpec::text("urinalysis_color"),
    FieldSpec::text("urinalysis_transparency"),
    FieldSpec::text("urinalysis_ph").alias("ph"),
    FieldSpec::text("urinalysis_glucose"),
    FieldSpec::text("urinalysis_protein"),
    FieldSpec::text("urinalysis_spgravity"),
    FieldSpec::text("urinalysis_wbc"),
    FieldSpec::text("urinalysis_rbc"),
    FieldSpec::text("urinalysis_bacteria"),
    FieldSpec::text("urinalysis_epithelial_cells"),
    FieldSpec::text("urinalysis_amorphous"),
    FieldSpec::text("urinalysis_phosphates").alias("urinalysis_phospates"),
    FieldSpec::text("urinalysis_mucus_threads"),
    FieldSpec::entries("urinalysis_casts"),
    FieldSpec::entries("urinalysis_crystals"),
    FieldSpec::entries("urinalysis_fungal_elements"),
    FieldSpec::entries("urinalysis_parasite"),
    FieldSpec::text("urinalysis_remarks"),
];

pub const HEMATOLOGY_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("cbc_wbc"),
    FieldSpec::text("cbc_neu"),
    FieldSpec::text("cbc_lym"),
    FieldSpec::text("cbc_mon"),
    FieldSpec::text("cbc_eos"),
    FieldSpec::text("cbc_bas"),
    FieldSpec::text("cbc_rbc"),
    FieldSpec::text("cbc_hgb"),
    FieldSpec::text("cbc_hct"),
    FieldSpec::text("cbc_mcv"),
    FieldSpec::text("cbc_mch"),
    FieldSpec::text("cbc_mchc"),
    FieldSpec::text("cbc_plt"),
    FieldSpec::text("cbc_remarks"),
    FieldSpec::text("bt_abo_group"),
    FieldSpec::text("bt_rh"),
];

pub const SEROLOGY_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("ss_result", FieldKind::Values),
    FieldSpec::text("ss_remarks"),
    FieldSpec::text("ss_kit").legacy(),
    FieldSpec::text("ss_lot_no").legacy(),
    FieldSpec::new("ss_expiration_date", FieldKind::Date).legacy(),
    FieldSpec::entries("dd_result"),
    FieldSpec::text("dd_remarks"),
    FieldSpec::text("dd_kit").legacy(),
    FieldSpec::text("dd_lot_no").legacy(),
    FieldSpec::new("dd_expiration_date", FieldKind::Date).legacy(),
    FieldSpec::new("hbsag_result", FieldKind::SingleResult),
    FieldSpec::text("hbsag_remarks"),
    FieldSpec::text("hbsag_kit").legacy(),
    FieldSpec::text("hbsag_lot_no").legacy(),
    FieldSpec::new("hbsag_expiration_date", FieldKind::Date).legacy(),
    FieldSpec::entries("hiv_result"),
    FieldSpec::text("hiv_remarks"),
    FieldSpec::text("hiv_kit").legacy(),
    FieldSpec::text("hiv_lot_no").legacy(),
    FieldSpec::new("hiv_expiration_date", FieldKind::Date).legacy(),
];

pub const CHEMISTRY_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("rbs"),
    FieldSpec::text("fasting"),
    FieldSpec::text("remarks"),
];

// ==================== VALUES ====================

/// One row of a repeatable sub-result (a cast, a crystal, a dengue marker...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ResultEntry {
    pub fn details_joined(&self) -> String {
        self.details.as_deref().unwrap_or_default().join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    Entries(Vec<ResultEntry>),
    List(Vec<String>),
    Values(Vec<serde_json::Value>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Column representation: scalars as plain text, sequences as JSON.
    pub fn to_column(&self) -> Result<String, serde_json::Error> {
        match self {
            FieldValue::Text(s) => Ok(s.clone()),
            FieldValue::Date(d) => Ok(d.format("%Y-%m-%d").to_string()),
            FieldValue::Entries(v) => serde_json::to_string(v),
            FieldValue::List(v) => serde_json::to_string(v),
            FieldValue::Values(v) => serde_json::to_string(v),
        }
    }
}

// ==================== RECORD ====================

/// A validated payload, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPayload {
    pub patient_id: String,
    pub kit_id: Option<String>,
    pub medical_technologist: Option<String>,
    pub reported_at: Option<NaiveDate>,
    pub fields: BTreeMap<String, FieldValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub id: String,
    pub kind: ResultKind,
    pub patient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kit_id: Option<String>,
    pub medical_technologist: Option<String>,
    pub reported_at: Option<NaiveDate>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResultRecord {
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(FieldValue::as_text)
    }

    pub fn date(&self, field: &str) -> Option<NaiveDate> {
        match self.fields.get(field) {
            Some(FieldValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn entries(&self, field: &str) -> &[ResultEntry] {
        match self.fields.get(field) {
            Some(FieldValue::Entries(v)) => v,
            _ => &[],
        }
    }

    pub fn first_result(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(FieldValue::List(v)) => v.first().map(String::as_str),
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn values(&self, field: &str) -> &[serde_json::Value] {
        match self.fields.get(field) {
            Some(FieldValue::Values(v)) => v,
            _ => &[],
        }
    }
}
