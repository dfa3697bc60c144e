//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - filled in by the workbook ingest pipeline
//! - carried unchanged inside every tick payload
//! - dumped as JSON by the CLI front-end

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;

/// One named daily metric replayed by the feed.
///
/// The set is closed: it mirrors the dashboard widgets, not whatever columns
/// happen to exist in a given workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKey {
    Moi,
    MoiInspect,
    WipSize,
    StartedWip,
    ExitedWip,
    WipSizeAvg,
    WipMin,
    WipMax,
    UnstartedLots,
}

impl MetricKey {
    pub const ALL: [MetricKey; 9] = [
        MetricKey::Moi,
        MetricKey::MoiInspect,
        MetricKey::WipSize,
        MetricKey::StartedWip,
        MetricKey::ExitedWip,
        MetricKey::WipSizeAvg,
        MetricKey::WipMin,
        MetricKey::WipMax,
        MetricKey::UnstartedLots,
    ];

    /// Stable key used in payloads and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKey::Moi => "moi",
            MetricKey::MoiInspect => "moiInspect",
            MetricKey::WipSize => "wipSize",
            MetricKey::StartedWip => "startedWip",
            MetricKey::ExitedWip => "exitedWip",
            MetricKey::WipSizeAvg => "wipSizeAvg",
            MetricKey::WipMin => "wipMin",
            MetricKey::WipMax => "wipMax",
            MetricKey::UnstartedLots => "unstartedLots",
        }
    }
}

/// How a metric's value column is matched against trimmed header text.
#[derive(Debug, Clone)]
pub enum ColumnMatch {
    /// Case-insensitive string equality.
    Exact(&'static str),
    /// Regex match.
    Pattern(Regex),
}

impl ColumnMatch {
    pub fn matches(&self, header: &str) -> bool {
        match self {
            ColumnMatch::Exact(name) => header.eq_ignore_ascii_case(name),
            ColumnMatch::Pattern(re) => re.is_match(header),
        }
    }
}

/// Optional in-place transform applied to a completed series.
pub type PostHook = fn(&mut [Option<f64>]);

/// Static configuration mapping a metric to its source sheet and column.
///
/// Candidates are tried in list order, then column order. `post` is an
/// extension point; no metric in the default table populates it.
#[derive(Debug, Clone)]
pub struct MetricSpec {
    pub key: MetricKey,
    pub sheet: &'static str,
    pub columns: Vec<ColumnMatch>,
    pub post: Option<PostHook>,
}

/// The resolved simulation window.
///
/// Created once per workbook load and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimWindow {
    /// First simulated day (UTC, day-truncated).
    pub start: NaiveDate,
    /// Last simulated day (inclusive).
    pub end: NaiveDate,
    /// Inclusive day span; always >= 1.
    pub days: usize,
    /// Constant wafer-starts figure from the summary sheet (0 when absent).
    pub wafer_starts: f64,
}

/// One-off KPI figures surfaced next to the per-day series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub wafer_starts: f64,
}

/// Per-metric daily series, one slot per simulated day.
///
/// Built once per workbook load and shared read-only afterwards. A missing
/// day or a skipped metric leaves `None` slots; series are never shorter
/// than the window's day count.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SeriesStore {
    series: BTreeMap<MetricKey, Vec<Option<f64>>>,
}

impl SeriesStore {
    /// Allocate an absent-filled series of the given length for every metric.
    pub fn with_len(days: usize) -> Self {
        let series = MetricKey::ALL
            .iter()
            .map(|key| (*key, vec![None; days]))
            .collect();
        Self { series }
    }

    pub fn get(&self, key: MetricKey) -> Option<&[Option<f64>]> {
        self.series.get(&key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKey, &[Option<f64>])> {
        self.series.iter().map(|(key, series)| (*key, series.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub(crate) fn replace(&mut self, key: MetricKey, series: Vec<Option<f64>>) {
        self.series.insert(key, series);
    }
}

/// Locale-style display strings for one tick (en-US, as the dashboard shows them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedStamp {
    pub date: String,
    pub time: String,
}

/// Which publisher produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadSource {
    Workbook,
    Random,
}

/// One tick's notification bundle, delivered to every subscriber in
/// registration order.
///
/// The series store reference is the same (unchanged) store on every tick;
/// only `tick` and the simulated date advance. Random mode sends an empty
/// store and zeroed wafer-starts for protocol compatibility.
#[derive(Debug, Clone, Serialize)]
pub struct TickPayload {
    pub tick: usize,
    pub sim_date: NaiveDateTime,
    pub formatted: FormattedStamp,
    pub series: Arc<SeriesStore>,
    pub wafer_starts: f64,
    pub window: Option<SimWindow>,
    pub summary: Summary,
    pub source: PayloadSource,
}
