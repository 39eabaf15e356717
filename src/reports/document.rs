// src/reports/document.rs
//! The projected report: a fixed grid of text cells, independent of any renderer.

use serde::Serialize;

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub filename: String,
    pub facility: Vec<String>,
    pub patient: PatientHeader,
    pub section: String,
    pub test: Option<String>,
    pub tables: Vec<Table>,
    pub remarks: String,
    pub technologist: Signatory,
    pub pathologist: Signatory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientHeader {
    pub name: String,
    pub age: Option<i32>,
    pub gender: String,
    pub date_of_birth: String,
    pub company: String,
    pub address: String,
    pub reported: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub heading: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(heading: Option<&str>, columns: &[&str]) -> Self {
        Self {
            heading: heading.map(str::to_string),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Number of cells every row is padded to.
    pub fn width(&self) -> usize {
        self.columns
            .len()
            .max(self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// A row whose label opens a sub-group, e.g. `Cast:`.
    pub fn group(label: &str) -> Self {
        Self::new(vec![Cell::label(label)])
    }

    pub fn has_warning(&self) -> bool {
        self.cells.iter().any(|c| c.warning)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Cell {
    pub text: String,
    #[serde(skip_serializing_if = "is_false")]
    pub label: bool,
    /// Rendered in the warning color.
    #[serde(skip_serializing_if = "is_false")]
    pub warning: bool,
    /// Column is widened to make room for an emphasized value.
    #[serde(skip_serializing_if = "is_false")]
    pub wide: bool,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Default::default() }
    }

    pub fn label(text: impl Into<String>) -> Self {
        Self { text: text.into(), label: true, ..Default::default() }
    }

    pub fn blank() -> Self {
        Self::default()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signatory {
    pub name: String,
    pub role: String,
    pub license: Option<String>,
}

impl Signatory {
    pub fn license_line(&self) -> String {
        format!("{}    Lic. No.: {}", self.role, self.license.as_deref().unwrap_or(""))
    }
}
