use std::io::Write;

use chrono::NaiveDate;
use thiserror::Error;

use logscope_types::LogRecord;

/// MIME type for exported blobs.
pub const EXPORT_MIME_TYPE: &str = "text/csv";

/// CSV column headers in display order.
pub const CSV_HEADERS: &[&str] = &["Timestamp", "IP Address", "Status", "Size", "Anomaly"];

/// Errors surfaced while serializing an export blob.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV writer: {0}")]
    Io(#[from] std::io::Error),
}

/// CSV exporter for the currently filtered record sequence.
///
/// Rows go out in the order given, with the anomaly flag rendered as
/// `Yes`/`No`. Fields containing the delimiter, quotes, or line breaks are
/// quote-escaped by the csv writer.
#[derive(Debug, Clone, Default)]
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        CsvExporter
    }

    /// Serialize records to a CSV string ready for download.
    pub fn to_csv_string(&self, records: &[LogRecord]) -> Result<String, ExportError> {
        let mut buf = Vec::new();
        self.write_to(records, &mut buf)?;
        // The writer only ever emits valid UTF-8
        Ok(String::from_utf8(buf).unwrap_or_default())
    }

    /// Serialize records to any writer.
    pub fn write_to<W: Write>(&self, records: &[LogRecord], writer: W) -> Result<(), ExportError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(CSV_HEADERS)?;
        for record in records {
            let anomaly = if record.is_anomalous() { "Yes" } else { "No" };
            csv_writer.write_record([
                record.timestamp.as_str(),
                record.ip.as_str(),
                record.status.as_str(),
                record.size.as_str(),
                anomaly,
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

/// Download filename for an export taken on the given date:
/// `log_analysis_<ISO-date>.csv`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("log_analysis_{}.csv", date.format("%Y-%m-%d"))
}
