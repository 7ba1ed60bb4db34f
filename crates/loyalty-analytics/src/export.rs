//! Workbook serialization and delivery.
//!
//! The default format is SpreadsheetML 2003 (one XML file with one
//! `<Worksheet>` per sheet), which Excel and LibreOffice open directly. A flat
//! CSV rendition stacks the sheets in one file for tools that want plain text.

use chrono::NaiveDate;
use csv::Writer;
use serde::Deserialize;
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::WriteError;
use crate::sheet::{Cell, Workbook, format_number};

/// Output formats for the finished report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// SpreadsheetML workbook with one worksheet per sheet.
    #[default]
    Workbook,
    /// All sheets stacked into a single CSV file.
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Workbook => "xml",
            Self::Csv => "csv",
        }
    }
}

/// `<Prefix>_Analytics_Report_<YYYY-MM-DD>.<ext>`
pub fn report_file_name(prefix: &str, date: NaiveDate, format: ExportFormat) -> String {
    format!(
        "{}_Analytics_Report_{}.{}",
        prefix,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

pub fn render(workbook: &Workbook, format: ExportFormat) -> Result<Vec<u8>, WriteError> {
    match format {
        ExportFormat::Workbook => render_spreadsheet_xml(workbook).map(String::into_bytes),
        ExportFormat::Csv => render_csv(workbook),
    }
}

// ── SpreadsheetML ───────────────────────────────────────────────────────────

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            // Other control characters are not representable in XML 1.0
            c if c.is_control() && c != '\t' && c != '\r' => {}
            c => out.push(c),
        }
    }
    out
}

fn write_cell(out: &mut String, cell: &Cell) -> std::fmt::Result {
    match cell {
        Cell::Empty => write!(out, "<Cell/>"),
        Cell::Text(s) => write!(out, r#"<Cell><Data ss:Type="String">{}</Data></Cell>"#, xml_escape(s)),
        Cell::Heading(s) => write!(
            out,
            r#"<Cell ss:StyleID="heading"><Data ss:Type="String">{}</Data></Cell>"#,
            xml_escape(s)
        ),
        Cell::Integer(n) => write!(out, r#"<Cell><Data ss:Type="Number">{}</Data></Cell>"#, n),
        Cell::Number(f) if f.is_finite() => write!(out, r#"<Cell><Data ss:Type="Number">{}</Data></Cell>"#, f),
        Cell::Number(f) => write!(
            out,
            r#"<Cell><Data ss:Type="String">{}</Data></Cell>"#,
            format_number(*f)
        ),
        Cell::Date(d) => write!(
            out,
            r#"<Cell ss:StyleID="date"><Data ss:Type="DateTime">{}T00:00:00.000</Data></Cell>"#,
            d.format("%Y-%m-%d")
        ),
        Cell::DateTime(dt) => write!(
            out,
            r#"<Cell ss:StyleID="datetime"><Data ss:Type="DateTime">{}</Data></Cell>"#,
            dt.format("%Y-%m-%dT%H:%M:%S%.3f")
        ),
    }
}

pub fn render_spreadsheet_xml(workbook: &Workbook) -> Result<String, WriteError> {
    let mut out = String::new();

    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<?mso-application progid=\"Excel.Sheet\"?>\n");
    out.push_str(concat!(
        "<Workbook xmlns=\"urn:schemas-microsoft-com:office:spreadsheet\"",
        " xmlns:o=\"urn:schemas-microsoft-com:office:office\"",
        " xmlns:x=\"urn:schemas-microsoft-com:office:excel\"",
        " xmlns:ss=\"urn:schemas-microsoft-com:office:spreadsheet\">\n",
    ));
    out.push_str(concat!(
        " <Styles>\n",
        "  <Style ss:ID=\"heading\"><Font ss:Bold=\"1\"/></Style>\n",
        "  <Style ss:ID=\"date\"><NumberFormat ss:Format=\"yyyy-mm-dd\"/></Style>\n",
        "  <Style ss:ID=\"datetime\"><NumberFormat ss:Format=\"yyyy-mm-dd hh:mm:ss\"/></Style>\n",
        " </Styles>\n",
    ));

    for sheet in &workbook.sheets {
        writeln!(out, r#" <Worksheet ss:Name="{}">"#, xml_escape(&sheet.name))?;
        out.push_str("  <Table>\n");
        for width in &sheet.column_widths {
            // SpreadsheetML widths are in points; ~7pt per character
            writeln!(out, r#"   <Column ss:Width="{}"/>"#, u32::from(*width) * 7)?;
        }
        for row in &sheet.rows {
            out.push_str("   <Row>");
            for cell in row {
                write_cell(&mut out, cell)?;
            }
            out.push_str("</Row>\n");
        }
        out.push_str("  </Table>\n");
        out.push_str(" </Worksheet>\n");
    }

    out.push_str("</Workbook>\n");
    Ok(out)
}

// ── Flat CSV ────────────────────────────────────────────────────────────────

pub fn render_csv(workbook: &Workbook) -> Result<Vec<u8>, WriteError> {
    let mut wtr = Writer::from_writer(Vec::new());
    let width = workbook
        .sheets
        .iter()
        .flat_map(|s| s.rows.iter().map(Vec::len).chain([s.column_widths.len()]))
        .max()
        .unwrap_or(1)
        .max(1);

    for (i, sheet) in workbook.sheets.iter().enumerate() {
        if i > 0 {
            wtr.write_record(vec![""; width])?;
        }
        let mut title = vec![String::new(); width];
        title[0] = format!("# {}", sheet.name);
        wtr.write_record(&title)?;

        for row in &sheet.rows {
            let mut record: Vec<String> = row.iter().map(Cell::display).collect();
            record.resize(width, String::new());
            wtr.write_record(&record)?;
        }
    }

    wtr.flush()?;
    wtr.into_inner().map_err(|e| WriteError::Serialize(e.to_string()))
}

// ── Delivery ────────────────────────────────────────────────────────────────

/// Hands the finished document to whoever triggered the run.
pub trait Deliver {
    /// Deliver `contents` under `file_name`; returns where it landed.
    fn deliver(&self, file_name: &str, contents: &[u8]) -> Result<PathBuf, WriteError>;
}

/// Save into a directory, never exposing a partially written file.
#[derive(Debug, Clone)]
pub struct SaveToDirectory {
    pub dir: PathBuf,
}

impl SaveToDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Deliver for SaveToDirectory {
    fn deliver(&self, file_name: &str, contents: &[u8]) -> Result<PathBuf, WriteError> {
        fs::create_dir_all(&self.dir)?;
        let target = self.dir.join(file_name);

        // Each run gets its own temp file; persisting renames it over the target.
        let mut partial = tempfile::Builder::new()
            .prefix(&format!(".{}.", file_name))
            .suffix(".partial")
            .tempfile_in(&self.dir)?;

        debug!(path = %partial.path().display(), bytes = contents.len(), "Writing report");
        partial.write_all(contents)?;
        partial.as_file().sync_all()?;
        partial.persist(&target).map_err(|e| e.error)?;

        info!(path = %target.display(), "Report saved");
        Ok(target)
    }
}
