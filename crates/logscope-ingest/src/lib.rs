//! Classified-results file loading for logscope
//!
//! This crate is the retrieval collaborator in front of the engine: it reads
//! a results file the classifier produced — CSV or a JSON array of records —
//! into the canonical record shape. It is the only part of the system that
//! touches the filesystem.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use thiserror::Error;

// Re-export the type this crate produces
pub use logscope_types::LogRecord;

/// Errors surfaced while loading a results file.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read results file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV results: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON results: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load a results file, dispatching on its extension: `.json` is parsed as
/// a JSON array of records, anything else as CSV.
pub fn load_records(path: &Path) -> Result<Vec<LogRecord>, IngestError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        load_json(path)
    } else {
        load_csv(path)
    }
}

/// Load records from a CSV results file.
pub fn load_csv(path: &Path) -> Result<Vec<LogRecord>, IngestError> {
    let file = File::open(path)?;
    let records = read_csv(BufReader::new(file))?;
    tracing::debug!(count = records.len(), path = %path.display(), "loaded CSV results");
    Ok(records)
}

/// Read records from CSV text.
///
/// The classifier writes its full frame, so rows carry extra columns
/// (`method`, `url`, `referer`, ...); anything that isn't part of the record
/// shape is ignored, and missing fields take their defaults.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<LogRecord>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut records = Vec::new();
    for row in csv_reader.deserialize() {
        let record: LogRecord = row?;
        records.push(record);
    }
    Ok(records)
}

/// Load records from a JSON results file (an array of record objects, as
/// served by the classifier's results endpoint).
pub fn load_json(path: &Path) -> Result<Vec<LogRecord>, IngestError> {
    let file = File::open(path)?;
    let records = read_json(BufReader::new(file))?;
    tracing::debug!(count = records.len(), path = %path.display(), "loaded JSON results");
    Ok(records)
}

/// Read records from a JSON array.
pub fn read_json<R: Read>(reader: R) -> Result<Vec<LogRecord>, IngestError> {
    let records: Vec<LogRecord> = serde_json::from_reader(reader)?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_with_classifier_columns() {
        let csv = "\
ip,timestamp,method,url,protocol,status,size,referer,user_agent,anomaly
10.0.0.1,2024-01-01 09:00:00+00:00,GET,/index.html,HTTP/1.1,200,512,-,curl/8.0,1
10.0.0.2,2024-01-01 09:05:00+00:00,POST,/login,HTTP/1.1,500,128,-,curl/8.0,-1
";
        let records = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ip, "10.0.0.1");
        assert_eq!(records[0].status, "200");
        assert_eq!(records[0].size, "512");
        assert!(!records[0].is_anomalous());
        assert!(records[1].is_anomalous());
    }

    #[test]
    fn test_read_csv_pandas_float_columns() {
        // A NaN anywhere in a pandas integer column widens it to floats
        let csv = "\
ip,timestamp,status,size,anomaly
10.0.0.1,2024-01-01 09:00:00,200.0,512.0,-1.0
";
        let records = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(records[0].size, "512");
        assert!(records[0].is_anomalous());
    }

    #[test]
    fn test_read_json_array() {
        let json = r#"[
            {"timestamp":"2024-01-01T09:00:00Z","ip":"1.1.1.1","status":"200","size":100,"anomaly":1},
            {"timestamp":"2024-01-01T09:05:00Z","ip":"1.1.1.1","status":"500","size":"bad","anomaly":-1}
        ]"#;
        let records = read_json(json.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].size, "bad");
        assert!(records[1].is_anomalous());
    }

    #[test]
    fn test_read_json_malformed_is_an_error() {
        assert!(read_json("{not json".as_bytes()).is_err());
    }

    #[test]
    fn test_read_csv_empty_input() {
        let records = read_csv("ip,timestamp,status,size,anomaly\n".as_bytes()).unwrap();
        assert!(records.is_empty());
    }
}
