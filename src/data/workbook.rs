//! Workbook fetch and parse.
//!
//! This is the only module that touches calamine: every cell collapses to a
//! plain [`Scalar`] at the read boundary, so the window resolver and the
//! series extractor never see the workbook library's value shapes.

use std::io::Cursor;
use std::path::PathBuf;

use calamine::{Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use reqwest::blocking::Client;

use crate::error::FeedError;

/// Bundled example produced by the fab simulator.
pub const DEFAULT_WORKBOOK: &str = "fabsim_output_data_example.xlsx";

/// Where the workbook bytes come from.
#[derive(Debug, Clone)]
pub enum WorkbookSource {
    Url(String),
    Path(PathBuf),
}

impl WorkbookSource {
    /// Classify a CLI/env argument: anything with an http scheme is a URL,
    /// everything else is a local path.
    pub fn from_arg(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            WorkbookSource::Url(arg.to_string())
        } else {
            WorkbookSource::Path(PathBuf::from(arg))
        }
    }
}

impl Default for WorkbookSource {
    fn default() -> Self {
        WorkbookSource::Path(PathBuf::from(DEFAULT_WORKBOOK))
    }
}

/// A workbook cell collapsed to a plain value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
    Absent,
}

impl Scalar {
    fn from_cell(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => Scalar::Absent,
            Data::Int(v) => Scalar::Number(*v as f64),
            Data::Float(v) => Scalar::Number(*v),
            Data::Bool(v) => Scalar::Number(if *v { 1.0 } else { 0.0 }),
            Data::String(s) => Scalar::Text(s.clone()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Scalar::Text(s.clone()),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(dt) => Scalar::Date(dt),
                None => Scalar::Absent,
            },
        }
    }

    /// Finite numeric view; numeric text parses, everything else is `None`.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(v) if v.is_finite() => Some(*v),
            Scalar::Text(s) => {
                let v = s.trim().parse::<f64>().ok()?;
                v.is_finite().then_some(v)
            }
            _ => None,
        }
    }

    /// Timestamp view, applying the summary-sheet normalization rules:
    /// dates pass through, strings parse against a fixed format list, and
    /// bare numbers are Excel day serials under the 1899-12-30 convention.
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Scalar::Date(dt) => Some(*dt),
            Scalar::Text(s) => parse_datetime_str(s.trim()),
            Scalar::Number(v) if v.is_finite() => serial_to_datetime(*v),
            _ => None,
        }
    }

    /// Best-effort text rendering, used for header and variable matching.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Scalar::Text(s) => Some(s.trim().to_string()),
            Scalar::Number(v) => Some(v.to_string()),
            Scalar::Date(dt) => Some(dt.to_string()),
            Scalar::Absent => None,
        }
    }
}

fn parse_datetime_str(s: &str) -> Option<NaiveDateTime> {
    const DT_FMTS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    for fmt in DT_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    const D_FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    for fmt in D_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let secs = (serial * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::seconds(secs))
}

/// One parsed sheet. The first row of the used range is the header row.
#[derive(Debug, Clone)]
pub struct SheetTable {
    pub name: String,
    pub rows: Vec<Vec<Scalar>>,
}

/// The parsed workbook, held only while the store is being built.
#[derive(Debug, Clone)]
pub struct WorkbookDoc {
    sheets: Vec<SheetTable>,
}

impl WorkbookDoc {
    pub(crate) fn new(sheets: Vec<SheetTable>) -> Self {
        Self { sheets }
    }

    /// Look up a sheet by exact name.
    pub fn sheet(&self, name: &str) -> Option<&SheetTable> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }
}

/// Fetch and parse the workbook.
///
/// Repeated calls re-fetch and re-parse; nothing is cached at this layer.
pub fn load_workbook(source: &WorkbookSource) -> Result<WorkbookDoc, FeedError> {
    let bytes = fetch_bytes(source)?;
    parse_workbook(bytes)
}

fn fetch_bytes(source: &WorkbookSource) -> Result<Vec<u8>, FeedError> {
    match source {
        WorkbookSource::Url(url) => {
            let resp = Client::new()
                .get(url)
                .send()
                .map_err(|e| FeedError::Load(format!("Failed to fetch '{url}': {e}")))?;
            if !resp.status().is_success() {
                return Err(FeedError::Load(format!(
                    "Failed to fetch '{url}': status {}",
                    resp.status()
                )));
            }
            let bytes = resp
                .bytes()
                .map_err(|e| FeedError::Load(format!("Failed to read body of '{url}': {e}")))?;
            Ok(bytes.to_vec())
        }
        WorkbookSource::Path(path) => std::fs::read(path).map_err(|e| {
            FeedError::Io(format!("Failed to read workbook '{}': {e}", path.display()))
        }),
    }
}

pub(crate) fn parse_workbook(bytes: Vec<u8>) -> Result<WorkbookDoc, FeedError> {
    let mut xlsx = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| FeedError::Parse(format!("Not a readable xlsx workbook: {e}")))?;

    let names = xlsx.sheet_names().to_owned();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = xlsx
            .worksheet_range(&name)
            .map_err(|e| FeedError::Parse(format!("Failed to read sheet '{name}': {e}")))?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(Scalar::from_cell).collect())
            .collect();
        sheets.push(SheetTable { name, rows });
    }

    log::debug!("workbook parsed: {} sheet(s)", sheets.len());
    Ok(WorkbookDoc::new(sheets))
}
