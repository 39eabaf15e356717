// src/reports/render/pdf.rs
//! In-process A4 renderer built on `printpdf` builtin fonts.

use async_trait::async_trait;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Rgb,
};
use std::io::BufWriter;

use super::{RenderError, ReportRenderer};
use crate::reports::{Cell, ReportDocument, Table};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const LEFT: f32 = 20.0;
const RIGHT_COLUMN: f32 = 120.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * LEFT;
const TOP: f32 = 280.0;
const BOTTOM: f32 = 20.0;

const TITLE_SIZE: f32 = 13.0;
const TEXT_SIZE: f32 = 10.0;
const SMALL_SIZE: f32 = 9.0;
const LINE: f32 = 5.0;

/// Approximate Helvetica advance, in mm per point of font size.
const CHAR_WIDTH: f32 = 0.5 * 0.3528;

#[derive(Debug, Default)]
pub struct BuiltinPdfRenderer;

impl BuiltinPdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReportRenderer for BuiltinPdfRenderer {
    fn name(&self) -> &'static str {
        "builtin"
    }

    async fn render(&self, document: &ReportDocument) -> Result<Vec<u8>, RenderError> {
        let document = document.clone();
        tokio::task::spawn_blocking(move || render_pdf(&document))
            .await
            .map_err(|e| RenderError::Engine(format!("render task failed: {}", e)))?
    }
}

fn engine<E: std::fmt::Display>(context: &'static str) -> impl Fn(E) -> RenderError {
    move |e| RenderError::Engine(format!("{}: {}", context, e))
}

pub fn render_pdf(document: &ReportDocument) -> Result<Vec<u8>, RenderError> {
    let (pdf, page, layer) = PdfDocument::new(&document.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = pdf.add_builtin_font(BuiltinFont::Helvetica).map_err(engine("font"))?;
    let bold = pdf.add_builtin_font(BuiltinFont::HelveticaBold).map_err(engine("font"))?;

    {
        let mut writer = PageWriter {
            pdf: &pdf,
            layer: pdf.get_page(page).get_layer(layer),
            y: TOP,
            regular: &regular,
            bold: &bold,
        };
        writer.document(document);
    }

    let mut buf = BufWriter::new(Vec::new());
    pdf.save(&mut buf).map_err(engine("PDF save error"))?;
    buf.into_inner().map_err(engine("PDF buffer error"))
}

struct PageWriter<'a> {
    pdf: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    regular: &'a IndirectFontRef,
    bold: &'a IndirectFontRef,
}

impl PageWriter<'_> {
    fn document(&mut self, doc: &ReportDocument) {
        // Facility header
        for (i, line) in doc.facility.iter().enumerate() {
            let size = if i == 0 { TITLE_SIZE } else { SMALL_SIZE };
            self.centered(line, size, i == 0);
        }
        self.rule();

        // Patient block
        let p = &doc.patient;
        let age = p.age.map(|a| a.to_string()).unwrap_or_default();
        self.pair(&format!("Name: {}", p.name), &format!("Age: {}    Gender: {}", age, p.gender));
        self.pair(&format!("Date of Birth: {}", p.date_of_birth), &format!("Reported: {}", p.reported));
        self.pair(&format!("Company: {}", p.company), "");
        self.pair(&format!("Address: {}", p.address), "");
        self.rule();

        self.centered(&doc.section, TEXT_SIZE + 1.0, true);
        self.rule();
        if let Some(test) = &doc.test {
            self.text(&format!("Test: {}", test), LEFT, TEXT_SIZE, true);
            self.advance(LINE);
            self.rule();
        }

        for table in &doc.tables {
            self.table(table);
        }
        self.rule();

        self.text(&format!("Remarks: {}", doc.remarks), LEFT, TEXT_SIZE, false);
        self.advance(LINE * 3.0);

        self.ensure(LINE * 2.0);
        self.text(&doc.technologist.name, LEFT, TEXT_SIZE, true);
        self.text(&doc.pathologist.name, RIGHT_COLUMN, TEXT_SIZE, true);
        self.advance(LINE);
        self.text(&doc.technologist.license_line(), LEFT, SMALL_SIZE, false);
        self.text(&doc.pathologist.license_line(), RIGHT_COLUMN, SMALL_SIZE, false);
        self.advance(LINE);
    }

    fn table(&mut self, table: &Table) {
        let width = table.width().max(1);
        let column = CONTENT_WIDTH / width as f32;

        if let Some(heading) = &table.heading {
            self.ensure(LINE);
            self.text(heading, LEFT, TEXT_SIZE, true);
            self.advance(LINE);
        }
        if !table.columns.is_empty() {
            self.ensure(LINE);
            for (i, name) in table.columns.iter().enumerate() {
                self.text(name, LEFT + column * i as f32, SMALL_SIZE, true);
            }
            self.advance(LINE);
        }
        for row in &table.rows {
            self.ensure(LINE);
            // A widened cell pushes the cells after it to the right.
            let mut shift = 0.0;
            for (i, cell) in row.cells.iter().enumerate() {
                self.cell(cell, LEFT + column * i as f32 + shift);
                if cell.wide {
                    shift += column * 0.25;
                }
            }
            self.advance(LINE);
        }
        self.advance(LINE / 2.0);
    }

    fn cell(&self, cell: &Cell, x: f32) {
        if cell.is_blank() {
            return;
        }
        if cell.warning {
            self.layer.set_fill_color(Color::Rgb(Rgb::new(0.85, 0.0, 0.0, None)));
        }
        self.text(&cell.text, x, TEXT_SIZE, cell.label || cell.warning);
        if cell.warning {
            self.layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        }
    }

    fn pair(&mut self, left: &str, right: &str) {
        self.ensure(LINE);
        self.text(left, LEFT, TEXT_SIZE, false);
        if !right.is_empty() {
            self.text(right, RIGHT_COLUMN, TEXT_SIZE, false);
        }
        self.advance(LINE);
    }

    fn centered(&mut self, text: &str, size: f32, bold: bool) {
        self.ensure(LINE);
        let width = text.chars().count() as f32 * size * CHAR_WIDTH;
        let x = ((PAGE_WIDTH - width) / 2.0).max(LEFT);
        self.text(text, x, size, bold);
        self.advance(LINE + 1.0);
    }

    fn rule(&mut self) {
        self.ensure(LINE);
        let count = (CONTENT_WIDTH / (SMALL_SIZE * CHAR_WIDTH)) as usize;
        self.text(&"_".repeat(count), LEFT, SMALL_SIZE, false);
        self.advance(LINE + 1.0);
    }

    fn text(&self, text: &str, x: f32, size: f32, bold: bool) {
        let font = if bold { self.bold } else { self.regular };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn advance(&mut self, mm: f32) {
        self.y -= mm;
    }

    /// Starts a new page when fewer than `needed` mm remain.
    fn ensure(&mut self, needed: f32) {
        if self.y - needed >= BOTTOM {
            return;
        }
        let (page, layer) = self.pdf.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.pdf.get_page(page).get_layer(layer);
        self.y = TOP;
    }
}
