use std::cmp::Ordering;

use logscope_types::{FilterCriteria, LogRecord, SortDirection, SortKey, SortSpec};

/// Compiled filter for log records
///
/// Pre-lowercases the search term once so matching a record is a pair of
/// substring scans, not a per-record allocation of the needle.
#[derive(Clone, Debug)]
pub struct CompiledQuery {
    /// Lowercased search term (empty = match all)
    search_lower: String,

    /// Keep only records the classifier flagged
    anomalies_only: bool,

    /// Status-code prefix to keep (None = all classes)
    status_prefix: Option<char>,
}

impl CompiledQuery {
    /// Compile filter criteria into a matchable query.
    pub fn new(criteria: &FilterCriteria) -> Self {
        Self {
            search_lower: criteria.search_term.to_lowercase(),
            anomalies_only: criteria.anomalies_only,
            status_prefix: criteria.status_class.prefix(),
        }
    }

    /// Check if a record satisfies every active predicate.
    pub fn matches(&self, record: &LogRecord) -> bool {
        if !self.search_lower.is_empty()
            && !record.ip.to_lowercase().contains(&self.search_lower)
            && !record.timestamp.to_lowercase().contains(&self.search_lower)
        {
            return false;
        }

        if self.anomalies_only && !record.is_anomalous() {
            return false;
        }

        match self.status_prefix {
            Some(prefix) => record.status.starts_with(prefix),
            None => true,
        }
    }

    /// Check if the query matches everything.
    pub fn is_empty(&self) -> bool {
        self.search_lower.is_empty() && !self.anomalies_only && self.status_prefix.is_none()
    }
}

/// Filter and sort the base record set into a fresh vector.
///
/// The input slice is never reordered; sorting happens on the copy. The sort
/// is stable, so equal-key records keep their relative order from the
/// filtered sequence. With no sort key the filtered records stay in
/// insertion order.
pub fn apply(records: &[LogRecord], criteria: &FilterCriteria, sort: &SortSpec) -> Vec<LogRecord> {
    let query = CompiledQuery::new(criteria);
    let mut result: Vec<LogRecord> = records
        .iter()
        .filter(|record| query.matches(record))
        .cloned()
        .collect();

    if let Some(key) = sort.key {
        result.sort_by(|a, b| {
            let ordering = compare_field(a, b, key);
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    tracing::debug!(
        total = records.len(),
        kept = result.len(),
        "applied query to base set"
    );
    result
}

/// Compare one field of two records. The anomaly flag is already numeric;
/// the text fields compare numerically when both values parse as numbers,
/// as strings otherwise.
fn compare_field(a: &LogRecord, b: &LogRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Anomaly => a.anomaly.cmp(&b.anomaly),
        SortKey::Timestamp => compare_values(&a.timestamp, &b.timestamp),
        SortKey::Ip => compare_values(&a.ip, &b.ip),
        SortKey::Status => compare_values(&a.status, &b.status),
        SortKey::Size => compare_values(&a.size, &b.size),
    }
}

fn compare_values(left: &str, right: &str) -> Ordering {
    match (left.parse::<f64>(), right.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        _ => left.cmp(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_types::StatusClassFilter;

    fn record(ts: &str, ip: &str, status: &str, size: &str, anomaly: i64) -> LogRecord {
        LogRecord {
            timestamp: ts.to_string(),
            ip: ip.to_string(),
            status: status.to_string(),
            size: size.to_string(),
            anomaly,
        }
    }

    fn sample() -> Vec<LogRecord> {
        vec![
            record("2024-01-01T09:00:00Z", "10.0.0.1", "200", "100", 1),
            record("2024-01-01T09:05:00Z", "10.0.0.2", "404", "250", -1),
            record("2024-01-01T10:00:00Z", "192.168.1.5", "500", "90", -1),
            record("2024-01-01T11:00:00Z", "10.0.0.1", "301", "0", 1),
        ]
    }

    #[test]
    fn test_empty_criteria_keeps_everything() {
        let records = sample();
        let result = apply(&records, &FilterCriteria::default(), &SortSpec::default());
        assert_eq!(result, records);
    }

    #[test]
    fn test_search_matches_ip_and_timestamp_case_insensitive() {
        let records = sample();
        let criteria = FilterCriteria {
            search_term: "192.168".to_string(),
            ..Default::default()
        };
        let result = apply(&records, &criteria, &SortSpec::default());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].ip, "192.168.1.5");

        // "t09" matches the timestamp, not the IP; uppercase needle still hits
        let criteria = FilterCriteria {
            search_term: "T09".to_string(),
            ..Default::default()
        };
        let result = apply(&records, &criteria, &SortSpec::default());
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_anomalies_only() {
        let records = sample();
        let criteria = FilterCriteria {
            anomalies_only: true,
            ..Default::default()
        };
        let result = apply(&records, &criteria, &SortSpec::default());
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|r| r.is_anomalous()));
    }

    #[test]
    fn test_status_class_prefix() {
        let records = sample();
        let criteria = FilterCriteria {
            status_class: StatusClassFilter::ClientError,
            ..Default::default()
        };
        let result = apply(&records, &criteria, &SortSpec::default());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].status, "404");
    }

    #[test]
    fn test_predicates_conjoin() {
        let records = sample();
        let criteria = FilterCriteria {
            search_term: "10.0.0".to_string(),
            anomalies_only: true,
            status_class: StatusClassFilter::ClientError,
        };
        let result = apply(&records, &criteria, &SortSpec::default());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].ip, "10.0.0.2");
    }

    #[test]
    fn test_numeric_sort_on_size() {
        let records = sample();
        let sort = SortSpec {
            key: Some(SortKey::Size),
            direction: SortDirection::Asc,
        };
        let result = apply(&records, &FilterCriteria::default(), &sort);
        let sizes: Vec<&str> = result.iter().map(|r| r.size.as_str()).collect();
        // Numeric order, not lexicographic ("90" < "100" < "250")
        assert_eq!(sizes, vec!["0", "90", "100", "250"]);
    }

    #[test]
    fn test_string_sort_when_values_non_numeric() {
        let mut records = sample();
        records[0].size = "bad".to_string();
        let sort = SortSpec {
            key: Some(SortKey::Ip),
            direction: SortDirection::Asc,
        };
        let result = apply(&records, &FilterCriteria::default(), &sort);
        let ips: Vec<&str> = result.iter().map(|r| r.ip.as_str()).collect();
        assert_eq!(ips, vec!["10.0.0.1", "10.0.0.1", "10.0.0.2", "192.168.1.5"]);
    }

    #[test]
    fn test_descending_reverses() {
        let records = sample();
        let sort = SortSpec {
            key: Some(SortKey::Size),
            direction: SortDirection::Desc,
        };
        let result = apply(&records, &FilterCriteria::default(), &sort);
        assert_eq!(result[0].size, "250");
        assert_eq!(result[3].size, "0");
    }

    #[test]
    fn test_sort_is_stable() {
        let records = vec![
            record("t1", "b", "200", "1", 1),
            record("t2", "a", "200", "1", 1),
            record("t3", "c", "200", "1", 1),
        ];
        let sort = SortSpec {
            key: Some(SortKey::Status),
            direction: SortDirection::Asc,
        };
        let result = apply(&records, &FilterCriteria::default(), &sort);
        // All keys equal: input order preserved
        let ips: Vec<&str> = result.iter().map(|r| r.ip.as_str()).collect();
        assert_eq!(ips, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_input_never_mutated() {
        let records = sample();
        let before = records.clone();
        let sort = SortSpec {
            key: Some(SortKey::Ip),
            direction: SortDirection::Desc,
        };
        let _ = apply(&records, &FilterCriteria::default(), &sort);
        assert_eq!(records, before);
    }
}
