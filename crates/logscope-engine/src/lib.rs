//! Results processing for logscope
//!
//! This crate turns a flat list of classified log records into the filtered,
//! sorted, paginated, aggregated, and exportable views a dashboard displays.
//! Everything here is a pure function of its inputs: the base record set is
//! never mutated, and every computation is total — malformed records fall
//! back to documented defaults instead of failing.

mod aggregate;
mod export;
mod paginate;
mod query;
mod session;

pub use aggregate::{status_distribution, summary, time_buckets};
pub use export::{export_filename, CsvExporter, ExportError, CSV_HEADERS, EXPORT_MIME_TYPE};
pub use paginate::paginate;
pub use query::{apply, CompiledQuery};
pub use session::AnalysisSession;

// Re-export types used in our public API
pub use logscope_types::{
    ColorClass, FilterCriteria, LogRecord, Page, SortDirection, SortKey, SortSpec,
    StatusClassFilter, StatusDistributionEntry, SummaryStats, TimeBucket, ViewState,
    DEFAULT_PAGE_SIZE,
};
