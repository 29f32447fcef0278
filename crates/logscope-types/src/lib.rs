//! Shared types for logscope
//!
//! This crate contains the canonical log record shape plus the view-state
//! and aggregate types used across the logscope crates.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// Default number of records shown per table page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Anomaly flag value marking a record as anomalous.
pub const ANOMALY_FLAG: i64 = -1;

// ============================================================================
// Record Model
// ============================================================================

/// A single classified web-server log record.
///
/// Records arrive pre-labeled from the classifier. Every field is optional in
/// the serialized form: a missing field becomes an empty string (or `0` for
/// the anomaly flag) rather than a deserialization error, so a partially
/// malformed row still flows through every downstream computation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Request timestamp as written by the classifier (ideally ISO-8601).
    #[serde(default)]
    pub timestamp: String,

    /// Client IP address.
    #[serde(default)]
    pub ip: String,

    /// HTTP status code as a string of decimal digits.
    #[serde(default)]
    pub status: String,

    /// Response size in bytes; kept as text because the classifier may emit
    /// a number, a numeric string, or garbage.
    #[serde(default, deserialize_with = "de_string_or_number")]
    pub size: String,

    /// Classifier output: `-1` means anomalous, anything else means normal.
    #[serde(default, deserialize_with = "de_lenient_int")]
    pub anomaly: i64,
}

impl LogRecord {
    /// Whether the classifier flagged this record as anomalous.
    pub fn is_anomalous(&self) -> bool {
        self.anomaly == ANOMALY_FLAG
    }

    /// First digit of the status code, if it starts with an ASCII digit.
    pub fn status_class(&self) -> Option<char> {
        self.status.chars().next().filter(char::is_ascii_digit)
    }

    /// Response size parsed as a non-negative byte count.
    ///
    /// Unparseable or negative values fall back to 0 so size sums and
    /// averages stay finite.
    pub fn size_bytes(&self) -> u64 {
        parse_size(&self.size)
    }

    /// Parse the timestamp field, trying the formats the classifier is known
    /// to emit. Returns `None` on failure rather than an error.
    pub fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.timestamp)
    }

    /// Hour of day (0-23) in the timestamp's own UTC offset, if the
    /// timestamp parses.
    pub fn hour_of_day(&self) -> Option<u32> {
        self.parsed_timestamp().map(|ts| ts.hour())
    }
}

/// Total size parser: integer first, then float rounded, else 0.
pub fn parse_size(raw: &str) -> u64 {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<u64>() {
        return n;
    }
    // pandas round-trips integer columns containing NaN as floats ("150.0")
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() && f > 0.0 {
            return f.round() as u64;
        }
    }
    0
}

/// Parse a timestamp in any of the formats seen in classifier output:
/// RFC 3339, pandas `to_csv` (with or without offset), and Apache
/// common-log format.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts);
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f%:z", "%d/%b/%Y:%H:%M:%S %z"] {
        if let Ok(ts) = DateTime::parse_from_str(trimmed, format) {
            return Some(ts);
        }
    }
    // Offset-less pandas output; treated as already-local wall time
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc().fixed_offset());
    }
    None
}

fn de_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumber;

    impl Visitor<'_> for StringOrNumber {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

fn de_lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientInt;

    impl Visitor<'_> for LenientInt {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an integer, float, or numeric string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            Ok(v as i64)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            Ok(if v.is_finite() { v.round() as i64 } else { 0 })
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            let trimmed = v.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                return Ok(n);
            }
            if let Ok(f) = trimmed.parse::<f64>() {
                if f.is_finite() {
                    return Ok(f.round() as i64);
                }
            }
            Ok(0)
        }

        fn visit_unit<E: de::Error>(self) -> Result<i64, E> {
            Ok(0)
        }
    }

    deserializer.deserialize_any(LenientInt)
}

// ============================================================================
// Filter & Sort State
// ============================================================================

/// Status-class restriction for the table filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClassFilter {
    #[default]
    All,
    #[serde(rename = "2")]
    Success,
    #[serde(rename = "3")]
    Redirect,
    #[serde(rename = "4")]
    ClientError,
    #[serde(rename = "5")]
    ServerError,
}

impl StatusClassFilter {
    /// The status-code prefix this filter keeps, or `None` for all.
    pub fn prefix(&self) -> Option<char> {
        match self {
            Self::All => None,
            Self::Success => Some('2'),
            Self::Redirect => Some('3'),
            Self::ClientError => Some('4'),
            Self::ServerError => Some('5'),
        }
    }

    /// Display label for this filter.
    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Success => "2xx",
            Self::Redirect => "3xx",
            Self::ClientError => "4xx",
            Self::ServerError => "5xx",
        }
    }
}

impl std::str::FromStr for StatusClassFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "2" | "2xx" => Ok(Self::Success),
            "3" | "3xx" => Ok(Self::Redirect),
            "4" | "4xx" => Ok(Self::ClientError),
            "5" | "5xx" => Ok(Self::ServerError),
            other => Err(format!("unknown status class: {other}")),
        }
    }
}

/// Table filter criteria.
///
/// The search term matches case-insensitively as a substring of the IP
/// address or the timestamp.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default)]
    pub search_term: String,

    #[serde(default)]
    pub anomalies_only: bool,

    #[serde(default)]
    pub status_class: StatusClassFilter,
}

impl FilterCriteria {
    /// Whether the criteria keep every record.
    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty()
            && !self.anomalies_only
            && self.status_class == StatusClassFilter::All
    }
}

/// Sortable record field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Timestamp,
    Ip,
    Status,
    Size,
    Anomaly,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Ip => "ip",
            Self::Status => "status",
            Self::Size => "size",
            Self::Anomaly => "anomaly",
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timestamp" => Ok(Self::Timestamp),
            "ip" => Ok(Self::Ip),
            "status" => Ok(Self::Status),
            "size" => Ok(Self::Size),
            "anomaly" => Ok(Self::Anomaly),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggle(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Active sort order for the table. No key means insertion order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: Option<SortKey>,
    pub direction: SortDirection,
}

impl SortSpec {
    /// React to a sort-header click: the same key toggles the direction,
    /// a new key sorts ascending.
    pub fn toggle_key(&mut self, key: SortKey) {
        if self.key == Some(key) {
            self.direction = self.direction.toggle();
        } else {
            self.key = Some(key);
            self.direction = SortDirection::Asc;
        }
    }
}

/// Complete interaction state for the table view.
///
/// Kept as one explicit serializable struct so the engine stays a pure
/// function of (base records, view state). Every mutation of the filter or
/// sort resets the page to 1, which keeps the page in range after the
/// result set shrinks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub criteria: FilterCriteria,
    pub sort: SortSpec,
    pub page_number: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            criteria: FilterCriteria::default(),
            sort: SortSpec::default(),
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewState {
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.criteria.search_term = term.into();
        self.page_number = 1;
    }

    pub fn set_anomalies_only(&mut self, on: bool) {
        self.criteria.anomalies_only = on;
        self.page_number = 1;
    }

    pub fn set_status_class(&mut self, class: StatusClassFilter) {
        self.criteria.status_class = class;
        self.page_number = 1;
    }

    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort.toggle_key(key);
        self.page_number = 1;
    }

    pub fn set_page(&mut self, page_number: usize) {
        self.page_number = page_number;
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Page bookkeeping for a sliced result set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 1-based page number, clamped into range.
    pub page_number: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl Page {
    /// Compute page metadata; an empty result set still has one page.
    pub fn new(page_number: usize, page_size: usize, total_items: usize) -> Self {
        // Zero page size would divide by zero; treat it as one per page
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size).max(1);
        Self {
            page_number: page_number.clamp(1, total_pages),
            page_size,
            total_items,
            total_pages,
        }
    }
}

// ============================================================================
// Aggregates
// ============================================================================

/// Summary statistics over the full base record set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_requests: usize,
    pub anomaly_count: usize,
    /// Anomalies as a percentage of all requests, rounded to 2 decimals.
    pub anomaly_rate_percent: f64,
    pub unique_ip_count: usize,
    /// Mean response size, rounded to the nearest byte.
    pub avg_response_size_bytes: u64,
}

/// Display color bucket derived from the status class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorClass {
    Success,
    Redirect,
    ClientError,
    ServerError,
    Neutral,
}

impl ColorClass {
    /// Derive from the first digit of a status code.
    pub fn from_status(status: &str) -> Self {
        match status.as_bytes().first() {
            Some(b'2') => Self::Success,
            Some(b'3') => Self::Redirect,
            Some(b'4') => Self::ClientError,
            Some(b'5') => Self::ServerError,
            _ => Self::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Redirect => "redirect",
            Self::ClientError => "client-error",
            Self::ServerError => "server-error",
            Self::Neutral => "neutral",
        }
    }
}

/// One bar of the status-code distribution chart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDistributionEntry {
    pub status_code: String,
    pub count: usize,
    pub color_class: ColorClass,
}

/// One hour bucket of the request time series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucket {
    /// `"H:00"` with no zero padding, H in 0-23.
    pub hour_label: String,
    pub request_count: usize,
    pub anomaly_count: usize,
    pub total_size_bytes: u64,
}

impl TimeBucket {
    /// Label for an hour of day.
    pub fn label_for_hour(hour: u32) -> String {
        format!("{hour}:00")
    }
}
