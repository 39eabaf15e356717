// src/reports/licenses.rs
//! Technologist name -> professional license number.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const BUILTIN: &[(&str, &str)] = &[
    ("JULLIUS D. ANUSENCION, RMT", "0056624"),
    ("KRISTINA CASSANDRA F. SANTOS, RMT", "0099818"),
    ("KATE ANGELINE M. SALAS, RMT", "0115834"),
    ("MARY GRACE L. BERNARDO, RMT", "0105656"),
    ("JANIELLE M. PASAMONTE, RMT", "0092719"),
];

#[derive(Debug, Deserialize)]
struct LicenseFile {
    #[serde(default)]
    licenses: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct LicenseRegistry {
    entries: HashMap<String, String>,
}

impl Default for LicenseRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LicenseRegistry {
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(name, license)| (name.to_string(), license.to_string()))
            .collect();
        Self { entries }
    }

    /// Built-in table, extended and overridden by an optional TOML file:
    ///
    /// ```toml
    /// [licenses]
    /// "JANE DOE, RMT" = "0123456"
    /// ```
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut registry = Self::builtin();
        let Some(path) = path else {
            return Ok(registry);
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read license table {}", path.display()))?;
        let file: LicenseFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse license table {}", path.display()))?;

        log::info!("Loaded {} technologist licenses from {}", file.licenses.len(), path.display());
        registry.entries.extend(file.licenses);
        Ok(registry)
    }

    /// Exact match on the stored name; anything else has no license on file.
    pub fn lookup(&self, technologist: &str) -> Option<&str> {
        self.entries.get(technologist).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
