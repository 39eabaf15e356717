// src/reports/render/html.rs
//! Self-contained HTML for external HTML-to-PDF converters. Images are inlined as data URIs.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt::Write;
use std::path::Path;

use super::RenderError;
use crate::config::ReportsConfig;
use crate::reports::{Cell, ReportDocument, Signatory, Table};

const STYLE: &str = r#"
body { font-family: Helvetica, Arial, sans-serif; font-size: 12px; margin: 20px 40px; }
.header { text-align: center; position: relative; }
.header h2 { margin: 0; font-size: 16px; }
.header h3 { margin: 0; font-size: 12px; font-weight: normal; }
.logo-left { position: absolute; left: 0; top: 0; height: 70px; }
.logo-right { position: absolute; right: 0; top: 0; height: 70px; }
hr { border: 0; border-top: 1px solid #000; }
table { border-collapse: collapse; width: 90%; margin-left: 40px; }
td, th { padding: 2px 6px; text-align: left; }
.section-title { text-align: center; font-weight: bold; margin: 4px 0; }
.label { font-weight: bold; }
.value { font-weight: bold; }
.warning { color: red; }
.wide { padding-right: 80px; }
.signatures td { width: 50%; vertical-align: bottom; }
.sig { height: 40px; }
"#;

/// Configured images, already encoded.
#[derive(Debug, Default, Clone)]
pub struct Assets {
    pub left_logo: Option<String>,
    pub right_logo: Option<String>,
    pub signature: Option<String>,
}

impl Assets {
    /// Reads every configured image; a configured path that cannot be read fails the render.
    pub fn load(config: &ReportsConfig) -> Result<Self, RenderError> {
        Ok(Self {
            left_logo: config.left_logo.as_deref().map(data_uri).transpose()?,
            right_logo: config.right_logo.as_deref().map(data_uri).transpose()?,
            signature: config.signature_image.as_deref().map(data_uri).transpose()?,
        })
    }
}

pub fn data_uri(path: &str) -> Result<String, RenderError> {
    let bytes = std::fs::read(path).map_err(|_| RenderError::MissingAsset(path.to_string()))?;
    let mime = match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("gif") => "image/gif",
        _ => "image/png",
    };
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn to_html(doc: &ReportDocument, assets: &Assets) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n",
        escape(&doc.title),
        STYLE
    );

    html.push_str("<div class=\"header\">\n");
    if let Some(logo) = &assets.left_logo {
        let _ = writeln!(html, "<img class=\"logo-left\" src=\"{}\">", logo);
    }
    for (i, line) in doc.facility.iter().enumerate() {
        let tag = if i == 0 { "h2" } else { "h3" };
        let _ = writeln!(html, "<{0}>{1}</{0}>", tag, escape(line));
    }
    if let Some(logo) = &assets.right_logo {
        let _ = writeln!(html, "<img class=\"logo-right\" src=\"{}\">", logo);
    }
    html.push_str("</div>\n<hr>\n");

    let p = &doc.patient;
    let age = p.age.map(|a| a.to_string()).unwrap_or_default();
    let _ = write!(
        html,
        "<table class=\"patient\">\n\
         <tr><td><strong>Name:</strong> {}</td><td><strong>Age:</strong> {} &nbsp; <strong>Gender:</strong> {}</td></tr>\n\
         <tr><td><strong>Date of Birth:</strong> {}</td><td><strong>Reported:</strong> {}</td></tr>\n\
         <tr><td><strong>Company:</strong> {}</td><td></td></tr>\n\
         <tr><td colspan=\"2\"><strong>Address:</strong> {}</td></tr>\n\
         </table>\n<hr>\n",
        escape(&p.name),
        escape(&age),
        escape(&p.gender),
        escape(&p.date_of_birth),
        escape(&p.reported),
        escape(&p.company),
        escape(&p.address),
    );

    let _ = writeln!(html, "<p class=\"section-title\">{}</p>\n<hr>", escape(&doc.section));
    if let Some(test) = &doc.test {
        let _ = writeln!(html, "<p><strong>Test:</strong> {}</p>\n<hr>", escape(test));
    }

    for table in &doc.tables {
        write_table(&mut html, table);
    }

    let _ = writeln!(html, "<hr>\n<p><strong>Remarks:</strong> {}</p>", escape(&doc.remarks));

    html.push_str("<table class=\"signatures\">\n<tr>\n");
    write_signatory(&mut html, &doc.technologist, None);
    write_signatory(&mut html, &doc.pathologist, assets.signature.as_deref());
    html.push_str("</tr>\n</table>\n</body>\n</html>\n");
    html
}

fn write_table(html: &mut String, table: &Table) {
    let width = table.width();
    if let Some(heading) = &table.heading {
        let _ = writeln!(html, "<p class=\"label\"><u>{}</u></p>", escape(heading));
    }
    html.push_str("<table class=\"analysis\">\n");
    if !table.columns.is_empty() {
        html.push_str("<tr>");
        for name in &table.columns {
            let _ = write!(html, "<th>{}</th>", escape(name));
        }
        html.push_str("</tr>\n");
    }
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in &row.cells {
            write_cell(html, cell);
        }
        for _ in row.cells.len()..width {
            html.push_str("<td></td>");
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
}

fn write_cell(html: &mut String, cell: &Cell) {
    let mut classes = Vec::new();
    if cell.label {
        classes.push("label");
    } else if !cell.is_blank() {
        classes.push("value");
    }
    if cell.warning {
        classes.push("warning");
    }
    if cell.wide {
        classes.push("wide");
    }
    if classes.is_empty() {
        let _ = write!(html, "<td>{}</td>", escape(&cell.text));
    } else {
        let _ = write!(html, "<td class=\"{}\">{}</td>", classes.join(" "), escape(&cell.text));
    }
}

fn write_signatory(html: &mut String, signatory: &Signatory, signature: Option<&str>) {
    html.push_str("<td>");
    if let Some(src) = signature {
        let _ = write!(html, "<img class=\"sig\" src=\"{}\">", src);
    }
    let _ = write!(
        html,
        "<p><strong>{}</strong></p><p>{}</p></td>\n",
        escape(&signatory.name),
        escape(&signatory.license_line())
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::{PatientHeader, Row};
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn document() -> ReportDocument {
        let mut table = Table::new(None, &["Test", "Result:"]);
        table.rows.push(Row::new(vec![
            Cell::label("Hepatitis B Virus surface antigen Screening"),
            Cell { warning: true, wide: true, ..Cell::text("Reactive") },
        ]));
        ReportDocument {
            title: "HBsAg Result".to_string(),
            filename: "hbsag_report.pdf".to_string(),
            facility: vec!["CONCEPCION DIAGNOSTIC CENTER".to_string()],
            patient: PatientHeader {
                name: "Ana <Test> & Co".to_string(),
                age: None,
                gender: "Female".to_string(),
                date_of_birth: String::new(),
                company: "OPD".to_string(),
                address: String::new(),
                reported: "July 30, 2025".to_string(),
            },
            section: "SEROLOGY RESULT".to_string(),
            test: None,
            tables: vec![table],
            remarks: "N/A".to_string(),
            technologist: Signatory {
                name: "JANE DOE, RMT".to_string(),
                role: "Medical Technologist".to_string(),
                license: None,
            },
            pathologist: Signatory {
                name: "NICK R. FERNANDEZ, M.D.".to_string(),
                role: "Pathologist".to_string(),
                license: Some("0100691".to_string()),
            },
        }
    }

    #[test]
    fn test_html_escapes_and_marks_warnings() {
        let html = to_html(&document(), &Assets::default());
        assert!(html.contains("Ana &lt;Test&gt; &amp; Co"));
        assert!(html.contains("<td class=\"value warning wide\">Reactive</td>"));
        assert!(html.contains("Pathologist    Lic. No.: 0100691"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_assets_are_inlined() {
        let mut logo = NamedTempFile::with_suffix(".png").unwrap();
        logo.write_all(b"not-really-a-png").unwrap();

        let config = ReportsConfig {
            left_logo: Some(logo.path().to_string_lossy().into_owned()),
            ..ReportsConfig::default()
        };
        let assets = Assets::load(&config).unwrap();
        let uri = assets.left_logo.clone().unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert!(to_html(&document(), &assets).contains(&uri));
    }

    #[test]
    fn test_missing_asset_is_an_error() {
        let config = ReportsConfig {
            signature_image: Some("/nonexistent/sig.png".to_string()),
            ..ReportsConfig::default()
        };
        match Assets::load(&config) {
            Err(RenderError::MissingAsset(path)) => assert_eq!(path, "/nonexistent/sig.png"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }
}
