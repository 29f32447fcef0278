use std::collections::{BTreeMap, HashSet};

use logscope_types::{ColorClass, LogRecord, StatusDistributionEntry, SummaryStats, TimeBucket};

/// Summary statistics over the full base record set.
///
/// Total for every input: an empty set yields all zeros, never NaN or
/// infinity, and unparseable sizes contribute 0 bytes to the average.
pub fn summary(records: &[LogRecord]) -> SummaryStats {
    let total_requests = records.len();
    let anomaly_count = records.iter().filter(|r| r.is_anomalous()).count();
    let unique_ip_count = records
        .iter()
        .map(|r| r.ip.as_str())
        .collect::<HashSet<_>>()
        .len();
    let total_size: u64 = records.iter().map(|r| r.size_bytes()).sum();

    let anomaly_rate_percent = if total_requests == 0 {
        0.0
    } else {
        round2(anomaly_count as f64 / total_requests as f64 * 100.0)
    };
    // Unparseable sizes stay in the denominator as zero-byte requests
    let avg_response_size_bytes =
        (total_size as f64 / total_requests.max(1) as f64).round() as u64;

    SummaryStats {
        total_requests,
        anomaly_count,
        anomaly_rate_percent,
        unique_ip_count,
        avg_response_size_bytes,
    }
}

/// Count records per exact status code, colored by status class.
///
/// Sorted by status code ascending so output is deterministic.
pub fn status_distribution(records: &[LogRecord]) -> Vec<StatusDistributionEntry> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.status.as_str()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(status, count)| StatusDistributionEntry {
            status_code: status.to_string(),
            count,
            color_class: ColorClass::from_status(status),
        })
        .collect()
}

/// Bucket records by hour of day.
///
/// Records whose timestamp fails to parse are skipped here (they still count
/// in `summary`). Buckets are sparse and ordered by numeric hour, so 9:00
/// precedes 10:00.
pub fn time_buckets(records: &[LogRecord]) -> Vec<TimeBucket> {
    struct Accum {
        requests: usize,
        anomalies: usize,
        bytes: u64,
    }

    let mut buckets: BTreeMap<u32, Accum> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in records {
        let Some(hour) = record.hour_of_day() else {
            skipped += 1;
            continue;
        };
        let bucket = buckets.entry(hour).or_insert(Accum {
            requests: 0,
            anomalies: 0,
            bytes: 0,
        });
        bucket.requests += 1;
        if record.is_anomalous() {
            bucket.anomalies += 1;
        }
        bucket.bytes += record.size_bytes();
    }

    if skipped > 0 {
        tracing::debug!(skipped, "records excluded from time buckets");
    }

    buckets
        .into_iter()
        .map(|(hour, accum)| TimeBucket {
            hour_label: TimeBucket::label_for_hour(hour),
            request_count: accum.requests,
            anomaly_count: accum.anomalies,
            total_size_bytes: accum.bytes,
        })
        .collect()
}

/// Round to 2 decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
