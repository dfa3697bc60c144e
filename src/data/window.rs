//! Simulation window resolution from the `Simulation_Summary` sheet.
//!
//! The summary sheet is a `variable`/`value` key-value table. Only three
//! variables matter here: `start_time`, `end_time`, and `wafers_starts`.

use crate::data::workbook::{Scalar, WorkbookDoc};
use crate::domain::SimWindow;
use crate::error::FeedError;

/// Sheet the simulator writes its run-level variables to.
pub const SUMMARY_SHEET: &str = "Simulation_Summary";

/// Resolve the simulation window.
///
/// Start and end are truncated to whole UTC calendar days before the day
/// count is derived; the span is inclusive, so a one-day run has `days == 1`.
pub fn resolve_window(doc: &WorkbookDoc) -> Result<SimWindow, FeedError> {
    let sheet = doc
        .sheet(SUMMARY_SHEET)
        .ok_or_else(|| FeedError::SheetNotFound(format!("{SUMMARY_SHEET} not found")))?;

    let header: &[Scalar] = sheet.rows.first().map(Vec::as_slice).unwrap_or(&[]);
    let (Some(var_col), Some(val_col)) = (find_header(header, "variable"), find_header(header, "value"))
    else {
        return Err(FeedError::Schema(format!(
            "{SUMMARY_SHEET} must have 'variable' and 'value' headers"
        )));
    };

    let mut start = None;
    let mut end = None;
    let mut wafer_starts = None;

    for row in sheet.rows.iter().skip(1) {
        let Some(name) = row.get(var_col).and_then(Scalar::to_text) else {
            continue;
        };
        let value = row.get(val_col).unwrap_or(&Scalar::Absent);
        match name.to_ascii_lowercase().as_str() {
            "start_time" => start = value.to_datetime(),
            "end_time" => end = value.to_datetime(),
            // Accept numbers, numeric text, or anything else as 0.
            "wafers_starts" => wafer_starts = Some(value.to_f64().unwrap_or(0.0)),
            _ => {}
        }
    }

    let (Some(start), Some(end)) = (start, end) else {
        return Err(FeedError::MissingWindow(format!(
            "Missing start_time or end_time in {SUMMARY_SHEET}"
        )));
    };

    // Whole calendar days; the time-of-day in the workbook is noise.
    let start = start.date();
    let end = end.date();
    if start > end {
        return Err(FeedError::InvalidWindow(format!(
            "start_time {start} is after end_time {end}"
        )));
    }

    let days = (end - start).num_days() as usize + 1;
    Ok(SimWindow {
        start,
        end,
        days,
        wafer_starts: wafer_starts.unwrap_or(0.0),
    })
}

fn find_header(row: &[Scalar], wanted: &str) -> Option<usize> {
    row.iter()
        .position(|cell| cell.to_text().is_some_and(|t| t.eq_ignore_ascii_case(wanted)))
}
