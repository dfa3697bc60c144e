//! Data acquisition: workbook ingest and synthetic telemetry.

pub mod random;
pub mod series;
pub mod window;
pub mod workbook;

pub use random::RandomMetrics;
pub use series::{build_series_store, extract_series, metric_specs};
pub use window::resolve_window;
pub use workbook::{DEFAULT_WORKBOOK, Scalar, SheetTable, WorkbookDoc, WorkbookSource, load_workbook};
