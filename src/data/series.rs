//! Per-metric series extraction and store assembly.
//!
//! Row position, not a date column, is the join key: every metric sheet
//! carries exactly one row per simulated day starting directly under the
//! header, in the same order as the simulation window.

use log::warn;

use crate::data::window::resolve_window;
use crate::data::workbook::{Scalar, SheetTable, WorkbookDoc};
use crate::domain::{ColumnMatch, MetricKey, MetricSpec, SeriesStore, SimWindow, Summary};
use crate::error::FeedError;

/// The static metric configuration table.
///
/// Candidates are tried in list order, then column order; matching is
/// case-insensitive.
pub fn metric_specs() -> Vec<MetricSpec> {
    use ColumnMatch::Exact;

    let spec = |key, sheet, column: &'static str| MetricSpec {
        key,
        sheet,
        columns: vec![Exact(column)],
        post: None,
    };

    vec![
        spec(MetricKey::Moi, "Daily_M_Over_I", "m_over_i_daily"),
        spec(MetricKey::MoiInspect, "Daily_M_Over_I", "m_over_i_inspection_daily"),
        spec(MetricKey::WipSize, "Capacity_Daily", "wip_size"),
        spec(MetricKey::StartedWip, "Capacity_Daily", "starts"),
        spec(MetricKey::ExitedWip, "Capacity_Daily", "exits"),
        spec(MetricKey::WipSizeAvg, "Capacity_Daily", "wip_size_avg"),
        spec(MetricKey::WipMin, "Capacity_Daily", "wip_min"),
        spec(MetricKey::WipMax, "Capacity_Daily", "wip_max"),
        spec(MetricKey::UnstartedLots, "Capacity_Daily", "unstarted_lots"),
    ]
}

/// Resolve the window, then populate one fixed-length series per metric.
///
/// Per-metric failures (missing sheet or column) are warnings: the metric's
/// series stays entirely absent-valued while the rest of the build proceeds.
pub fn build_series_store(doc: &WorkbookDoc) -> Result<(SimWindow, SeriesStore, Summary), FeedError> {
    let window = resolve_window(doc)?;
    let mut store = SeriesStore::with_len(window.days);

    for spec in metric_specs() {
        if let Some(series) = extract_series(doc, window.days, &spec) {
            store.replace(spec.key, series);
        }
    }

    let summary = Summary {
        wafer_starts: window.wafer_starts,
    };
    Ok((window, store, summary))
}

/// Extract one metric's series.
///
/// `None` means the metric was skipped (sheet or column missing); the caller
/// keeps the all-absent series in that case. Within a found column, a missing
/// row or a non-numeric cell leaves that single day absent.
pub fn extract_series(doc: &WorkbookDoc, days: usize, spec: &MetricSpec) -> Option<Vec<Option<f64>>> {
    let Some(sheet) = doc.sheet(spec.sheet) else {
        warn!("series: sheet not found for {}: {}", spec.key.as_str(), spec.sheet);
        return None;
    };

    let headers = header_names(sheet);
    let Some(col) = find_column(&headers, &spec.columns) else {
        warn!(
            "series: value column not found in sheet {} for {}; headers: {:?}",
            spec.sheet,
            spec.key.as_str(),
            headers
        );
        return None;
    };

    let mut series = vec![None; days];
    for (day, slot) in series.iter_mut().enumerate() {
        // Row 0 is the header, so row 1 + day holds day `day`.
        let Some(row) = sheet.rows.get(1 + day) else {
            continue;
        };
        *slot = row.get(col).and_then(Scalar::to_f64);
    }

    if let Some(post) = spec.post {
        post(&mut series);
    }
    Some(series)
}

/// Trimmed header names, with `col_{i}` placeholders for blanks (1-based).
fn header_names(sheet: &SheetTable) -> Vec<String> {
    let Some(header) = sheet.rows.first() else {
        return Vec::new();
    };
    header
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell.to_text() {
            Some(name) if !name.is_empty() => name,
            _ => format!("col_{}", i + 1),
        })
        .collect()
}

/// First match in candidate-list order, then column order.
fn find_column(headers: &[String], candidates: &[ColumnMatch]) -> Option<usize> {
    for cand in candidates {
        if let Some(idx) = headers.iter().position(|h| cand.matches(h)) {
            return Some(idx);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::workbook::parse_workbook;
    use chrono::NaiveDate;
    use regex::Regex;
    use rust_xlsxwriter::Workbook;

    fn text(s: &str) -> Scalar {
        Scalar::Text(s.to_string())
    }

    fn num(v: f64) -> Scalar {
        Scalar::Number(v)
    }

    fn sheet(name: &str, rows: Vec<Vec<Scalar>>) -> SheetTable {
        SheetTable {
            name: name.to_string(),
            rows,
        }
    }

    fn one_column_spec(sheet: &'static str, column: &'static str) -> MetricSpec {
        MetricSpec {
            key: MetricKey::WipSize,
            sheet,
            columns: vec![ColumnMatch::Exact(column)],
            post: None,
        }
    }

    #[test]
    fn exact_match_wins_over_substring_lookalikes() {
        let doc = WorkbookDoc::new(vec![sheet(
            "Capacity_Daily",
            vec![
                vec![text("WIP_Size"), text("wip_size_avg")],
                vec![num(10.0), num(99.0)],
            ],
        )]);
        let spec = one_column_spec("Capacity_Daily", "wip_size");
        let series = extract_series(&doc, 1, &spec).unwrap();
        assert_eq!(series, vec![Some(10.0)]);
    }

    #[test]
    fn candidates_are_tried_in_list_order() {
        let doc = WorkbookDoc::new(vec![sheet(
            "Capacity_Daily",
            vec![
                vec![text("alpha"), text("beta")],
                vec![num(1.0), num(2.0)],
            ],
        )]);
        let spec = MetricSpec {
            key: MetricKey::WipSize,
            sheet: "Capacity_Daily",
            columns: vec![ColumnMatch::Exact("beta"), ColumnMatch::Exact("alpha")],
            post: None,
        };
        let series = extract_series(&doc, 1, &spec).unwrap();
        assert_eq!(series, vec![Some(2.0)]);
    }

    #[test]
    fn pattern_candidates_match_by_regex() {
        let doc = WorkbookDoc::new(vec![sheet(
            "Daily_M_Over_I",
            vec![
                vec![text("m_over_i_daily"), text("m_over_i_inspection_daily")],
                vec![num(1.5), num(2.5)],
            ],
        )]);
        let spec = MetricSpec {
            key: MetricKey::MoiInspect,
            sheet: "Daily_M_Over_I",
            columns: vec![ColumnMatch::Pattern(Regex::new(r"inspection").unwrap())],
            post: None,
        };
        assert_eq!(extract_series(&doc, 1, &spec).unwrap(), vec![Some(2.5)]);
    }

    #[test]
    fn blank_headers_get_positional_placeholders() {
        let doc = WorkbookDoc::new(vec![sheet(
            "Capacity_Daily",
            vec![
                vec![Scalar::Absent, text("wip_size")],
                vec![num(7.0), num(70.0)],
            ],
        )]);
        let spec = one_column_spec("Capacity_Daily", "col_1");
        assert_eq!(extract_series(&doc, 1, &spec).unwrap(), vec![Some(7.0)]);
    }

    #[test]
    fn short_sheets_yield_absent_tail_not_short_series() {
        let doc = WorkbookDoc::new(vec![sheet(
            "Capacity_Daily",
            vec![
                vec![text("wip_size")],
                vec![num(10.0)],
                vec![num(11.0)],
            ],
        )]);
        let spec = one_column_spec("Capacity_Daily", "wip_size");
        let series = extract_series(&doc, 5, &spec).unwrap();
        assert_eq!(series, vec![Some(10.0), Some(11.0), None, None, None]);
    }

    #[test]
    fn non_numeric_cells_leave_single_absent_slots() {
        let doc = WorkbookDoc::new(vec![sheet(
            "Capacity_Daily",
            vec![
                vec![text("wip_size")],
                vec![num(10.0)],
                vec![text("n/a")],
                vec![num(12.0)],
            ],
        )]);
        let spec = one_column_spec("Capacity_Daily", "wip_size");
        let series = extract_series(&doc, 3, &spec).unwrap();
        assert_eq!(series, vec![Some(10.0), None, Some(12.0)]);
    }

    #[test]
    fn missing_sheet_and_missing_column_are_skips_not_errors() {
        let doc = WorkbookDoc::new(vec![sheet(
            "Capacity_Daily",
            vec![vec![text("starts")], vec![num(1.0)]],
        )]);
        assert!(extract_series(&doc, 1, &one_column_spec("Nowhere", "x")).is_none());
        assert!(extract_series(&doc, 1, &one_column_spec("Capacity_Daily", "wip_size")).is_none());
    }

    #[test]
    fn post_hook_transforms_the_completed_series() {
        fn double(series: &mut [Option<f64>]) {
            for slot in series {
                *slot = slot.map(|v| v * 2.0);
            }
        }
        let doc = WorkbookDoc::new(vec![sheet(
            "Capacity_Daily",
            vec![vec![text("wip_size")], vec![num(3.0)]],
        )]);
        let spec = MetricSpec {
            post: Some(double),
            ..one_column_spec("Capacity_Daily", "wip_size")
        };
        assert_eq!(extract_series(&doc, 1, &spec).unwrap(), vec![Some(6.0)]);
    }

    /// End-to-end: a real xlsx built in memory, parsed, resolved, extracted.
    #[test]
    fn builds_the_store_from_a_generated_workbook() {
        let mut wb = Workbook::new();

        let ws = wb.add_worksheet();
        ws.set_name("Simulation_Summary").unwrap();
        ws.write_string(0, 0, "variable").unwrap();
        ws.write_string(0, 1, "value").unwrap();
        ws.write_string(1, 0, "start_time").unwrap();
        ws.write_string(1, 1, "2023-07-01").unwrap();
        ws.write_string(2, 0, "end_time").unwrap();
        ws.write_string(2, 1, "2023-07-03").unwrap();
        ws.write_string(3, 0, "wafers_starts").unwrap();
        ws.write_number(3, 1, 500.0).unwrap();

        let ws = wb.add_worksheet();
        ws.set_name("Daily_M_Over_I").unwrap();
        ws.write_string(0, 0, "m_over_i_daily").unwrap();
        ws.write_string(0, 1, "m_over_i_inspection_daily").unwrap();
        for day in 0..3u32 {
            ws.write_number(day + 1, 0, 1.0 + day as f64).unwrap();
            ws.write_number(day + 1, 1, 0.5 + day as f64).unwrap();
        }

        // Capacity sheet with fewer rows than the window and a lookalike column.
        let ws = wb.add_worksheet();
        ws.set_name("Capacity_Daily").unwrap();
        ws.write_string(0, 0, "WIP_Size").unwrap();
        ws.write_string(0, 1, "wip_size_avg").unwrap();
        ws.write_string(0, 2, "starts").unwrap();
        ws.write_number(1, 0, 100.0).unwrap();
        ws.write_number(1, 1, 90.0).unwrap();
        ws.write_number(1, 2, 20.0).unwrap();
        ws.write_number(2, 0, 110.0).unwrap();
        ws.write_number(2, 1, 95.0).unwrap();
        ws.write_number(2, 2, 25.0).unwrap();

        let bytes = wb.save_to_buffer().unwrap();
        let doc = parse_workbook(bytes).unwrap();

        let (window, store, summary) = build_series_store(&doc).unwrap();
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2023, 7, 1).unwrap());
        assert_eq!(window.days, 3);
        assert_eq!(summary.wafer_starts, 500.0);

        // Every metric series has window length, populated or not.
        for (_, series) in store.iter() {
            assert_eq!(series.len(), 3);
        }

        assert_eq!(store.get(MetricKey::Moi).unwrap(), &[Some(1.0), Some(2.0), Some(3.0)]);
        // Case-insensitive exact match: WIP_Size, never wip_size_avg.
        assert_eq!(
            store.get(MetricKey::WipSize).unwrap(),
            &[Some(100.0), Some(110.0), None]
        );
        assert_eq!(
            store.get(MetricKey::StartedWip).unwrap(),
            &[Some(20.0), Some(25.0), None]
        );
        // No exits column anywhere: skipped metric stays all-absent.
        assert_eq!(store.get(MetricKey::ExitedWip).unwrap(), &[None, None, None]);
    }
}
