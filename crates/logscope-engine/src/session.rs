use logscope_types::{
    FilterCriteria, LogRecord, Page, SortSpec, StatusDistributionEntry, SummaryStats, TimeBucket,
    ViewState,
};

use crate::export::{CsvExporter, ExportError};
use crate::{aggregate, paginate, query};

/// Cache for the filtered result set to avoid re-filtering when only the
/// page number changed.
#[derive(Default)]
struct ResultCache {
    /// Criteria the cache was built for
    criteria: FilterCriteria,
    /// Sort spec the cache was built for
    sort: SortSpec,
    /// The cached filtered + sorted records
    entries: Vec<LogRecord>,
    /// Whether cache is valid
    valid: bool,
}

impl ResultCache {
    fn needs_refresh(&self, criteria: &FilterCriteria, sort: &SortSpec) -> bool {
        !self.valid || self.criteria != *criteria || self.sort != *sort
    }

    fn update(&mut self, criteria: FilterCriteria, sort: SortSpec, entries: Vec<LogRecord>) {
        self.criteria = criteria;
        self.sort = sort;
        self.entries = entries;
        self.valid = true;
    }
}

/// One analysis session over a loaded base record set.
///
/// The base set is taken at load time and never changes afterwards. The
/// aggregates (summary, status distribution, time buckets) are the slow
/// path: computed once here, independent of any later table interaction, so
/// charts always reflect the whole upload. The table view is the fast path:
/// recomputed from the base set and the current [`ViewState`] on demand.
pub struct AnalysisSession {
    records: Vec<LogRecord>,
    state: ViewState,
    summary: SummaryStats,
    status_distribution: Vec<StatusDistributionEntry>,
    time_buckets: Vec<TimeBucket>,
    cache: ResultCache,
}

impl AnalysisSession {
    /// Load a base record set and compute its aggregates.
    pub fn load(records: Vec<LogRecord>) -> Self {
        let summary = aggregate::summary(&records);
        let status_distribution = aggregate::status_distribution(&records);
        let time_buckets = aggregate::time_buckets(&records);
        tracing::debug!(total = records.len(), "session loaded");

        Self {
            records,
            state: ViewState::default(),
            summary,
            status_distribution,
            time_buckets,
            cache: ResultCache::default(),
        }
    }

    /// The full, unfiltered base record set.
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Current interaction state.
    pub fn view_state(&self) -> &ViewState {
        &self.state
    }

    /// Mutable interaction state. The [`ViewState`] mutators reset the page
    /// number on any filter or sort change.
    pub fn view_state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    /// Summary statistics over the whole base set.
    pub fn summary(&self) -> &SummaryStats {
        &self.summary
    }

    /// Status-code distribution over the whole base set.
    pub fn status_distribution(&self) -> &[StatusDistributionEntry] {
        &self.status_distribution
    }

    /// Hourly time series over the whole base set.
    pub fn time_buckets(&self) -> &[TimeBucket] {
        &self.time_buckets
    }

    /// The filtered and sorted sequence for the current view state.
    pub fn filtered(&mut self) -> &[LogRecord] {
        self.refresh_cache();
        &self.cache.entries
    }

    /// The current table page plus its metadata.
    pub fn current_page(&mut self) -> (&[LogRecord], Page) {
        self.refresh_cache();
        paginate::paginate(
            &self.cache.entries,
            self.state.page_number,
            self.state.page_size,
        )
    }

    /// Serialize the currently filtered sequence (not the base set, not the
    /// current page) for download.
    pub fn export_csv(&mut self) -> Result<String, ExportError> {
        self.refresh_cache();
        CsvExporter::new().to_csv_string(&self.cache.entries)
    }

    fn refresh_cache(&mut self) {
        if !self
            .cache
            .needs_refresh(&self.state.criteria, &self.state.sort)
        {
            return;
        }
        let entries = query::apply(&self.records, &self.state.criteria, &self.state.sort);
        self.cache
            .update(self.state.criteria.clone(), self.state.sort, entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_types::{SortKey, StatusClassFilter};

    fn record(ts: &str, ip: &str, status: &str, size: &str, anomaly: i64) -> LogRecord {
        LogRecord {
            timestamp: ts.to_string(),
            ip: ip.to_string(),
            status: status.to_string(),
            size: size.to_string(),
            anomaly,
        }
    }

    fn session() -> AnalysisSession {
        AnalysisSession::load(vec![
            record("2024-01-01T09:00:00Z", "10.0.0.1", "200", "100", 1),
            record("2024-01-01T09:05:00Z", "10.0.0.2", "404", "250", -1),
            record("2024-01-01T10:00:00Z", "192.168.1.5", "500", "90", -1),
        ])
    }

    #[test]
    fn test_aggregates_ignore_filter_state() {
        let mut session = session();
        let before = session.summary().clone();

        session.view_state_mut().set_anomalies_only(true);
        let _ = session.current_page();

        assert_eq!(session.summary(), &before);
        assert_eq!(session.status_distribution().len(), 3);
        assert_eq!(session.time_buckets().len(), 2);
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut session = session();
        session.view_state_mut().set_page(3);
        session.view_state_mut().set_status_class(StatusClassFilter::ServerError);

        let (slice, page) = session.current_page();
        assert_eq!(page.page_number, 1);
        assert_eq!(slice.len(), 1);
        assert_eq!(slice[0].status, "500");
    }

    #[test]
    fn test_export_reflects_filtered_sequence() {
        let mut session = session();
        session.view_state_mut().set_anomalies_only(true);

        let text = session.export_csv().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with(",Yes"));
        assert!(lines[2].ends_with(",Yes"));
    }

    #[test]
    fn test_page_change_keeps_filtered_results() {
        let mut session = session();
        session.view_state_mut().toggle_sort(SortKey::Size);
        let first: Vec<LogRecord> = session.filtered().to_vec();

        session.view_state_mut().set_page(2);
        let second: Vec<LogRecord> = session.filtered().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn test_base_set_untouched_by_interaction() {
        let mut session = session();
        session.view_state_mut().toggle_sort(SortKey::Size);
        let _ = session.current_page();

        // Base set keeps insertion order regardless of table sorting
        assert_eq!(session.records()[0].ip, "10.0.0.1");
        assert_eq!(session.records()[2].ip, "192.168.1.5");
    }
}
