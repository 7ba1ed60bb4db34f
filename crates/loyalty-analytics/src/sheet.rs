//! Logical workbook model: named sheets holding grids of typed cells.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AssemblyError;

/// One typed spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    /// Section titles and table headers (rendered bold where supported).
    Heading(String),
    Integer(i64),
    Number(f64),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn heading(s: impl Into<String>) -> Self {
        Self::Heading(s.into())
    }

    /// Plain-text form used by flat exports.
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) | Self::Heading(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Number(f) => format_number(*f),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Non-finite values have no numeric cell form; keep their string representation.
pub fn format_number(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{:.0}", f)
    } else {
        f.to_string()
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Self::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Cell {
    fn from(f: f64) -> Self {
        Self::Number(f)
    }
}

impl From<NaiveDate> for Cell {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

pub type Row = Vec<Cell>;

/// One named grid with fixed column width hints (in characters).
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub column_widths: Vec<u16>,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, column_widths: &[u16]) -> Self {
        Self {
            name: name.into(),
            column_widths: column_widths.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn blank(&mut self) {
        self.rows.push(Vec::new());
    }

    pub fn header(&mut self, labels: &[&str]) {
        self.rows.push(labels.iter().map(|l| Cell::heading(*l)).collect());
    }

    /// Index of the first row whose leading cell is the heading `label`.
    pub fn find_heading(&self, label: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| matches!(r.first(), Some(Cell::Heading(h)) if h == label))
    }
}

/// Ordered sheets plus the non-fatal problems met while filling them.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    pub issues: Vec<AssemblyError>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(Cell::Integer(42).display(), "42");
        assert_eq!(Cell::Number(12.0).display(), "12");
        assert_eq!(Cell::Number(12.5).display(), "12.5");
        assert_eq!(Cell::Number(f64::NAN).display(), "NaN");
        assert_eq!(Cell::Number(f64::INFINITY).display(), "inf");
        assert_eq!(Cell::Date(NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()).display(), "2026-10-01");
        assert_eq!(Cell::Empty.display(), "");
    }

    #[test]
    fn find_heading_locates_sections() {
        let mut sheet = Sheet::new("S", &[10]);
        sheet.push(vec![Cell::text("title")]);
        sheet.blank();
        sheet.push(vec![Cell::heading("Section")]);
        assert_eq!(sheet.find_heading("Section"), Some(2));
        assert_eq!(sheet.find_heading("title"), None);
    }
}
