// src/reports/mod.rs
//! Report projection: (result record, patient, kit) -> fixed-layout document.
//!
//! Projection is pure. Loading the inputs and turning the document into bytes
//! happen elsewhere (`report_handlers` and [`render`]).

pub mod derive;
pub mod document;
pub mod layout;
pub mod licenses;
pub mod render;

use chrono::NaiveDate;
use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::config::ReportsConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::{Patient, ReagentKit, ResultKind, ResultRecord};
use crate::validator::FieldValidator;

pub use document::{Cell, PatientHeader, ReportDocument, Row, Signatory, Table};
pub use licenses::LicenseRegistry;

use layout::{Block, Layout, Line, Rule, Source};

// ==================== SUBTYPES ====================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize,
    EnumString, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReportSubtype {
    Urinalysis,
    Fecalysis,
    Cbc,
    BloodType,
    Syphilis,
    Hbsag,
    Dengue,
    Hiv,
    Rbs,
    Fbs,
}

impl ReportSubtype {
    pub fn kind(&self) -> ResultKind {
        match self {
            ReportSubtype::Urinalysis | ReportSubtype::Fecalysis => ResultKind::Clinical,
            ReportSubtype::Cbc | ReportSubtype::BloodType => ResultKind::Hematology,
            ReportSubtype::Syphilis | ReportSubtype::Hbsag | ReportSubtype::Dengue | ReportSubtype::Hiv => {
                ResultKind::Serology
            }
            ReportSubtype::Rbs | ReportSubtype::Fbs => ResultKind::Chemistry,
        }
    }

    pub fn filename(&self) -> &'static str {
        match self {
            ReportSubtype::Urinalysis => "urinalysis_report.pdf",
            ReportSubtype::Fecalysis => "fecalysis_report.pdf",
            ReportSubtype::Cbc => "CBC_report.pdf",
            ReportSubtype::BloodType => "blood-type_report.pdf",
            ReportSubtype::Syphilis => "syphilis_report.pdf",
            ReportSubtype::Hbsag => "hbsag_report.pdf",
            ReportSubtype::Dengue => "dengue_report.pdf",
            ReportSubtype::Hiv => "hiv_report.pdf",
            ReportSubtype::Rbs => "rbs_report.pdf",
            ReportSubtype::Fbs => "fbs_report.pdf",
        }
    }

    pub fn for_kind(kind: ResultKind) -> Vec<ReportSubtype> {
        Self::iter().filter(|s| s.kind() == kind).collect()
    }
}

// ==================== PROJECTION ====================

pub struct ReportContext<'a> {
    /// Reference date for age and the reported-date fallback.
    pub today: NaiveDate,
    pub config: &'a ReportsConfig,
    pub licenses: &'a LicenseRegistry,
}

pub fn project(
    record: &ResultRecord,
    patient: &Patient,
    kit: Option<&ReagentKit>,
    subtype: ReportSubtype,
    ctx: &ReportContext<'_>,
) -> ApiResult<ReportDocument> {
    if record.kind != subtype.kind() {
        return Err(ApiError::NotFound(format!(
            "No {} report exists for {} results",
            subtype, record.kind
        )));
    }
    if record.patient_id != patient.id {
        return Err(ApiError::InternalServerError(format!(
            "Result '{}' belongs to patient '{}', not '{}'",
            record.id, record.patient_id, patient.id
        )));
    }

    let layout = layout::for_subtype(subtype);
    let tables = layout
        .blocks
        .iter()
        .map(|block| project_block(block, record, kit))
        .collect();

    Ok(ReportDocument {
        title: layout.title.to_string(),
        filename: subtype.filename().to_string(),
        facility: ctx.config.facility_lines.clone(),
        patient: patient_header(patient, record, ctx.today),
        section: layout.section.to_string(),
        test: layout.test.map(str::to_string),
        tables,
        remarks: remarks(layout, record),
        technologist: technologist(record, ctx),
        pathologist: Signatory {
            name: ctx.config.pathologist_name.clone(),
            role: "Pathologist".to_string(),
            license: Some(ctx.config.pathologist_license.clone()),
        },
    })
}

fn patient_header(patient: &Patient, record: &ResultRecord, today: NaiveDate) -> PatientHeader {
    PatientHeader {
        name: derive::ucwords(&patient.name),
        age: patient.date_of_birth.and_then(|dob| derive::age_on(dob, today)),
        gender: derive::ucfirst(&patient.gender),
        date_of_birth: patient.date_of_birth.map(derive::long_date).unwrap_or_default(),
        company: patient
            .company
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "OPD".to_string()),
        address: patient.address.clone().unwrap_or_default(),
        reported: derive::long_date(record.reported_at.unwrap_or(today)),
    }
}

fn remarks(layout: &Layout, record: &ResultRecord) -> String {
    record.text(layout.remarks).unwrap_or("N/A").to_string()
}

fn technologist(record: &ResultRecord, ctx: &ReportContext<'_>) -> Signatory {
    let stored = record.medical_technologist.as_deref();
    Signatory {
        name: stored.unwrap_or(&ctx.config.default_technologist).to_string(),
        role: "Medical Technologist".to_string(),
        license: stored.and_then(|name| ctx.licenses.lookup(name)).map(str::to_string),
    }
}

fn project_block(block: &Block, record: &ResultRecord, kit: Option<&ReagentKit>) -> Table {
    match *block {
        Block::Lines { heading, columns, width, lines } => {
            let mut table = Table::new(heading, columns);
            for line in lines {
                let mut cells = line_cells(line, record);
                cells.truncate(width);
                table.rows.push(Row::new(cells));
            }
            table
        }
        Block::Entries { heading, groups } => {
            let mut table = Table::new(heading, &[]);
            for group in groups {
                let entries = record.entries(group.field);
                if entries.is_empty() {
                    continue;
                }
                table.rows.push(Row::group(group.label));
                for entry in entries {
                    table.rows.push(Row::new(vec![
                        Cell::label(derive::humanize(&entry.entry_type)),
                        Cell::text(entry.details_joined().to_uppercase()),
                        Cell::text(group.unit),
                    ]));
                }
            }
            table
        }
        Block::Values { label, field } => {
            let mut table = Table::new(None, &["Test", "Result:"]);
            let values = record.values(field);
            if values.is_empty() {
                table.rows.push(Row::new(vec![Cell::label(label), Cell::blank()]));
            }
            for (i, value) in values.iter().enumerate() {
                let label = if i == 0 { Cell::label(label) } else { Cell::blank() };
                table.rows.push(Row::new(vec![label, Cell::text(display_value(value).to_uppercase())]));
            }
            table
        }
        Block::Kit { panel } => kit_table(panel, record, kit),
    }
}

/// Label, value, unit, range for one line of a fixed grid. Missing values stay as blank cells.
fn line_cells(line: &Line, record: &ResultRecord) -> Vec<Cell> {
    let (label, raw, mut value) = match line.source {
        Source::Field(field) => {
            let raw = record.text(field);
            (line.label, raw, raw.map(|v| Cell::text(v.to_uppercase())).unwrap_or_default())
        }
        Source::SingleResult(field) => {
            let raw = record.first_result(field).filter(|v| !v.trim().is_empty());
            let display = raw.map(|v| derive::ucfirst(&v.trim().to_lowercase()));
            (line.label, raw, display.map(Cell::text).unwrap_or_default())
        }
        Source::FirstPresent { options, fallback } => {
            match options.iter().find_map(|(label, field)| record.text(field).map(|v| (*label, v))) {
                Some((label, raw)) => (label, Some(raw), Cell::text(raw.to_uppercase())),
                None => (line.label, None, Cell::text(fallback)),
            }
        }
        Source::Fixed(text) => (line.label, None, Cell::text(text)),
    };

    if let Some(raw) = raw {
        match line.rule {
            Rule::Plain => {}
            Rule::Above(limit) => {
                value.warning = FieldValidator::numeric_value(raw).map_or(false, |v| v > limit);
            }
            Rule::Flag(word) => {
                let flagged = raw.trim().eq_ignore_ascii_case(word);
                value.warning = flagged;
                value.wide = flagged;
            }
        }
    }

    vec![Cell::label(label), value, Cell::text(line.unit), Cell::text(line.range)]
}

/// The linked kit wins; records without one fall back to the superseded per-panel fields.
fn kit_table(panel: &str, record: &ResultRecord, kit: Option<&ReagentKit>) -> Table {
    let name = kit
        .map(|k| k.kit_name.clone())
        .or_else(|| record.text(&format!("{}_kit", panel)).map(str::to_string))
        .unwrap_or_default();
    let lot = kit
        .and_then(|k| k.kit_lot_no.clone())
        .or_else(|| record.text(&format!("{}_lot_no", panel)).map(str::to_string))
        .unwrap_or_default();
    let expiry = kit
        .and_then(|k| k.kit_expiration_date)
        .or_else(|| record.date(&format!("{}_expiration_date", panel)))
        .map(derive::month_year)
        .unwrap_or_default();

    let mut table = Table::new(None, &[]);
    table.rows.push(Row::new(vec![Cell::text(format!("Kit use: {}", name))]));
    table.rows.push(Row::new(vec![Cell::text(format!("LOT NO. {}", lot))]));
    table.rows.push(Row::new(vec![Cell::text(format!("Expiration Date: {}", expiry))]));
    table
}

fn display_value(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Object(obj) => {
            let kind = obj.get("type").and_then(Value::as_str).map(derive::humanize);
            let details = obj
                .get("details")
                .and_then(Value::as_array)
                .map(|d| d.iter().map(display_value).collect::<Vec<_>>().join(", "));
            match (kind, details) {
                (Some(k), Some(d)) if !d.is_empty() => format!("{}: {}", k, d),
                (Some(k), _) => k,
                (None, Some(d)) => d,
                (None, None) => value.to_string(),
            }
        }
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use crate::validator::{validate_result_payload, ValidationMode};
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use std::str::FromStr;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 30).unwrap()
    }

    fn patient() -> Patient {
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 8, 0, 0).unwrap();
        Patient {
            id: "p1".to_string(),
            name: "juan dela cruz".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1),
            gender: "Male".to_string(),
            company: None,
            address: Some("123 St".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    fn record(kind: ResultKind, value: Value, mode: ValidationMode) -> ResultRecord {
        let Value::Object(mut map) = value else { panic!("expected an object") };
        map.insert("patient_id".to_string(), json!("p1"));
        let payload = validate_result_payload(kind, &map, mode).unwrap().payload;
        let now = Utc.with_ymd_and_hms(2025, 7, 30, 9, 0, 0).unwrap();
        ResultRecord {
            id: "r1".to_string(),
            kind,
            patient_id: payload.patient_id,
            kit_id: payload.kit_id,
            medical_technologist: payload.medical_technologist,
            reported_at: payload.reported_at,
            fields: payload.fields,
            created_at: now,
            updated_at: now,
        }
    }

    fn project_with(record: &ResultRecord, kit: Option<&ReagentKit>, subtype: ReportSubtype) -> ReportDocument {
        let config = ReportsConfig::default();
        let licenses = LicenseRegistry::builtin();
        let ctx = ReportContext { today: today(), config: &config, licenses: &licenses };
        project(record, &patient(), kit, subtype, &ctx).unwrap()
    }

    fn find_row<'d>(doc: &'d ReportDocument, label: &str) -> &'d Row {
        doc.tables
            .iter()
            .flat_map(|t| t.rows.iter())
            .find(|r| r.cells.first().map(|c| c.text.as_str()) == Some(label))
            .unwrap_or_else(|| panic!("no row labelled {}", label))
    }

    fn chemistry(rbs: &str) -> ResultRecord {
        record(
            ResultKind::Chemistry,
            json!({ "rbs": rbs, "medical_technologist": "JULLIUS D. ANUSENCION, RMT" }),
            ValidationMode::Standard,
        )
    }

    #[test]
    fn test_subtype_slugs_and_filenames() {
        assert_eq!(ReportSubtype::from_str("blood-type").unwrap(), ReportSubtype::BloodType);
        assert_eq!(ReportSubtype::Cbc.to_string(), "cbc");
        assert_eq!(ReportSubtype::Cbc.filename(), "CBC_report.pdf");
        assert_eq!(ReportSubtype::BloodType.filename(), "blood-type_report.pdf");
        assert_eq!(
            ReportSubtype::for_kind(ResultKind::Serology),
            vec![ReportSubtype::Syphilis, ReportSubtype::Hbsag, ReportSubtype::Dengue, ReportSubtype::Hiv]
        );
        assert!(ReportSubtype::from_str("lipid").is_err());
    }

    #[test]
    fn test_rbs_warning_threshold() {
        let doc = project_with(&chemistry("150"), None, ReportSubtype::Rbs);
        let row = find_row(&doc, "Random Blood Sugar");
        assert_eq!(row.cells[1].text, "150");
        assert!(row.cells[1].warning);
        assert_eq!(row.cells[3].text, "70 - 140 mg/dl");

        let doc = project_with(&chemistry("120"), None, ReportSubtype::Rbs);
        assert!(!find_row(&doc, "Random Blood Sugar").has_warning());

        let doc = project_with(&chemistry("140"), None, ReportSubtype::Rbs);
        assert!(!find_row(&doc, "Random Blood Sugar").has_warning());

        let doc = project_with(&chemistry("abc"), None, ReportSubtype::Rbs);
        let row = find_row(&doc, "Random Blood Sugar");
        assert!(!row.has_warning());
        assert_eq!(row.cells[1].text, "ABC");
    }

    #[test]
    fn test_header_and_signatures_for_known_technologist() {
        let doc = project_with(&chemistry("150"), None, ReportSubtype::Rbs);

        assert_eq!(doc.filename, "rbs_report.pdf");
        assert_eq!(doc.section, "CHEMISTRY RESULT");
        assert_eq!(doc.patient.name, "Juan Dela Cruz");
        assert_eq!(doc.patient.age, Some(35));
        assert_eq!(doc.patient.gender, "Male");
        assert_eq!(doc.patient.date_of_birth, "January 1, 1990");
        assert_eq!(doc.patient.company, "OPD");
        assert_eq!(doc.patient.reported, "July 30, 2025");
        assert_eq!(doc.remarks, "N/A");
        assert_eq!(doc.technologist.name, "JULLIUS D. ANUSENCION, RMT");
        assert_eq!(doc.technologist.license.as_deref(), Some("0056624"));
        assert_eq!(doc.pathologist.name, "NICK R. FERNANDEZ, M.D.");
        assert_eq!(doc.pathologist.license.as_deref(), Some("0100691"));
    }

    #[test]
    fn test_unknown_or_missing_technologist_has_no_license() {
        let rec = record(
            ResultKind::Chemistry,
            json!({ "fasting": "95", "medical_technologist": "Jullius D. Anusencion, RMT" }),
            ValidationMode::Standard,
        );
        let doc = project_with(&rec, None, ReportSubtype::Fbs);
        assert_eq!(doc.technologist.name, "Jullius D. Anusencion, RMT");
        assert_eq!(doc.technologist.license, None);

        let rec = record(ResultKind::Serology, json!({ "hbsag_result": "NONREACTIVE" }), ValidationMode::Import);
        let doc = project_with(&rec, None, ReportSubtype::Hbsag);
        assert_eq!(doc.technologist.name, "JULLIUS ANUSENCION, RMT");
        assert_eq!(doc.technologist.license, None);
    }

    #[test]
    fn test_reported_date_prefers_record() {
        let rec = record(
            ResultKind::Chemistry,
            json!({ "rbs": "99", "medical_technologist": "X", "reported_at": "2025-07-02" }),
            ValidationMode::Standard,
        );
        let doc = project_with(&rec, None, ReportSubtype::Rbs);
        assert_eq!(doc.patient.reported, "July 2, 2025");
    }

    #[test]
    fn test_projection_is_deterministic() {
        let rec = chemistry("150");
        let first = project_with(&rec, None, ReportSubtype::Rbs);
        let second = project_with(&rec, None, ReportSubtype::Rbs);
        assert_eq!(first, second);
    }

    #[test]
    fn test_hbsag_reactive_is_flagged_and_widened() {
        let rec = record(ResultKind::Serology, json!({ "hbsag_result": ["reactive"] }), ValidationMode::Import);
        let doc = project_with(&rec, None, ReportSubtype::Hbsag);
        let row = find_row(&doc, "Hepatitis B Virus surface antigen Screening");
        assert_eq!(row.cells[1].text, "Reactive");
        assert!(row.cells[1].warning);
        assert!(row.cells[1].wide);

        let rec = record(ResultKind::Serology, json!({ "hbsag_result": ["NONREACTIVE"] }), ValidationMode::Import);
        let doc = project_with(&rec, None, ReportSubtype::Hbsag);
        let row = find_row(&doc, "Hepatitis B Virus surface antigen Screening");
        assert_eq!(row.cells[1].text, "Nonreactive");
        assert!(!row.cells[1].warning && !row.cells[1].wide);
    }

    #[test]
    fn test_missing_values_render_as_blank_cells() {
        let rec = record(
            ResultKind::Clinical,
            json!({ "urinalysis_color": "yellow", "medical_technologist": "X" }),
            ValidationMode::Standard,
        );
        let doc = project_with(&rec, None, ReportSubtype::Urinalysis);

        assert_eq!(find_row(&doc, "Color:").cells[1].text, "YELLOW");
        let glucose = find_row(&doc, "Glucose:");
        assert_eq!(glucose.cells.len(), 2);
        assert!(glucose.cells[1].is_blank());
        let wbc = find_row(&doc, "WBC:");
        assert!(wbc.cells[1].is_blank());
        assert_eq!(wbc.cells[2].text, "/HPF");
        assert_eq!(find_row(&doc, "Amorphous:").cells[1].text, "N/A");
    }

    #[test]
    fn test_amorphous_row_prefers_urates() {
        let rec = record(
            ResultKind::Clinical,
            json!({ "urinalysis_amorphous": "few", "urinalysis_phospates": "many", "medical_technologist": "X" }),
            ValidationMode::Standard,
        );
        let doc = project_with(&rec, None, ReportSubtype::Urinalysis);
        assert_eq!(find_row(&doc, "Amorphous Urates:").cells[1].text, "FEW");

        let rec = record(
            ResultKind::Clinical,
            json!({ "urinalysis_phosphates": "many", "medical_technologist": "X" }),
            ValidationMode::Standard,
        );
        let doc = project_with(&rec, None, ReportSubtype::Urinalysis);
        assert_eq!(find_row(&doc, "Amorphous Phosphates:").cells[1].text, "MANY");
    }

    #[test]
    fn test_entries_are_flattened_under_group_labels() {
        let rec = record(
            ResultKind::Clinical,
            json!({
                "medical_technologist": "X",
                "urinalysis_casts": [{ "type": "hyaline_cast", "details": ["few", "0-2"] }],
                "urinalysis_parasite": [{ "type": "giardia" }]
            }),
            ValidationMode::Standard,
        );
        let doc = project_with(&rec, None, ReportSubtype::Urinalysis);
        let others = doc.tables.iter().find(|t| t.heading.as_deref() == Some("Others:")).unwrap();
        let texts: Vec<Vec<&str>> = others
            .rows
            .iter()
            .map(|r| r.cells.iter().map(|c| c.text.as_str()).collect())
            .collect();
        assert_eq!(
            texts,
            vec![
                vec!["Cast:"],
                vec!["Hyaline cast", "FEW, 0-2", "/LPF"],
                vec!["Parasite:"],
                vec!["Giardia", "", "/HPF"],
            ]
        );
    }

    #[test]
    fn test_linked_kit_wins_over_legacy_fields() {
        let rec = record(
            ResultKind::Serology,
            json!({
                "dd_result": [{ "type": "ns1", "details": ["negative"] }],
                "dd_kit": "Old Kit",
                "dd_lot_no": "OLD-1",
                "dd_expiration_date": "2024-03-31"
            }),
            ValidationMode::Import,
        );
        let doc = project_with(&rec, None, ReportSubtype::Dengue);
        assert_eq!(find_row(&doc, "Kit use: Old Kit").cells.len(), 1);
        find_row(&doc, "LOT NO. OLD-1");
        find_row(&doc, "Expiration Date: March 2024");
        assert_eq!(find_row(&doc, "Ns1").cells[1].text, "NEGATIVE");

        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let kit = ReagentKit {
            id: "k1".to_string(),
            kit_name: "Dengue Duo".to_string(),
            kit_types: Some("Dengue".to_string()),
            kit_lot_no: Some("DD-9".to_string()),
            kit_expiration_date: NaiveDate::from_ymd_opt(2026, 12, 31),
            created_at: now,
            updated_at: now,
        };
        let doc = project_with(&rec, Some(&kit), ReportSubtype::Dengue);
        find_row(&doc, "Kit use: Dengue Duo");
        find_row(&doc, "LOT NO. DD-9");
        find_row(&doc, "Expiration Date: December 2026");
    }

    #[test]
    fn test_syphilis_values_are_listed() {
        let mut rec = record(ResultKind::Serology, json!({}), ValidationMode::Import);
        rec.fields.insert(
            "ss_result".to_string(),
            FieldValue::Values(vec![json!("nonreactive"), json!({ "type": "rpr", "details": ["1:8"] })]),
        );
        let doc = project_with(&rec, None, ReportSubtype::Syphilis);
        let table = &doc.tables[0];
        assert_eq!(table.rows[0].cells[1].text, "NONREACTIVE");
        assert_eq!(table.rows[1].cells[1].text, "RPR: 1:8");
        assert!(table.rows[1].cells[0].is_blank());
    }

    #[test]
    fn test_cbc_grid_keeps_every_row() {
        let rec = record(
            ResultKind::Hematology,
            json!({ "cbc_wbc": "7.2", "medical_technologist": "X", "cbc_remarks": "normal" }),
            ValidationMode::Standard,
        );
        let doc = project_with(&rec, None, ReportSubtype::Cbc);
        let rows: usize = doc.tables.iter().map(|t| t.rows.len()).sum();
        assert_eq!(rows, 13);
        let bas = find_row(&doc, "BAS%:");
        assert!(bas.cells[1].is_blank());
        assert_eq!(bas.cells[3].text, "0 - 1");
        assert_eq!(doc.remarks, "normal");
    }

    #[test]
    fn test_subtype_of_another_category_is_not_found() {
        let rec = chemistry("150");
        let config = ReportsConfig::default();
        let licenses = LicenseRegistry::builtin();
        let ctx = ReportContext { today: today(), config: &config, licenses: &licenses };
        let err = project(&rec, &patient(), None, ReportSubtype::Cbc, &ctx).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
