use logscope_types::{LogRecord, Page, DEFAULT_PAGE_SIZE};

/// Slice a result sequence into one fixed-size page.
///
/// The requested page number is clamped to `[1, total_pages]`, so an
/// out-of-range request returns the nearest valid page instead of an error.
/// An empty sequence yields an empty slice with one (empty) total page.
pub fn paginate(records: &[LogRecord], page_number: usize, page_size: usize) -> (&[LogRecord], Page) {
    // Guard the division; a zero page size falls back to the default
    let page_size = if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    };

    let page = Page::new(page_number, page_size, records.len());
    let start = (page.page_number - 1).saturating_mul(page_size).min(records.len());
    let end = start.saturating_add(page_size).min(records.len());
    (&records[start..end], page)
}
