// # Extractor
//
// Turns speed-test pages into `IpRecord`s.
//
// Pages render a table whose rows read, once markup is stripped:
//
// ```text
// 1  电信  1.2.3.4  0%  10ms  100Mbps  50Mbps  LAX  2024-01-01
// ```
//
// i.e. an ordinal, the line token, the IP literal, then measurement columns.
// Only the line token and the IP are captured; the next four fields are
// consumed so that a measurement column is never mistaken for the start of a
// new row. Matching runs over the whole text, left to right, without regard
// for line breaks.

use crate::model::{IpRecord, LineType, LineTypeFilter};
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

/// ordinal, line token, IP literal, then four more fields
static ROW_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+(\S+)\s+([\d.:a-fA-F]+)\s+\S+\s+\S+\s+\S+\s+\S+")
        .expect("row pattern is valid")
});

/// Strip markup from an HTML document, returning its text nodes concatenated
/// in document order.
pub fn strip_markup(html: &str) -> String {
    let document = Html::parse_document(html);
    document.root_element().text().collect()
}

/// Scan plain text for table rows.
///
/// The returned iterator is lazy and borrows `text`; calling `extract` again on
/// the same text yields the same sequence.
pub fn extract<'a>(
    text: &'a str,
    filter: &'a LineTypeFilter,
) -> impl Iterator<Item = IpRecord> + 'a {
    ROW_PATTERN.captures_iter(text).filter_map(move |caps| {
        let line_type = LineType::from_token(caps.get(2)?.as_str());
        if !filter.allows(&line_type) {
            return None;
        }
        let address = caps.get(3)?.as_str();
        Some(IpRecord::new(address, line_type))
    })
}

/// Strip markup and collect every matching row of a page
pub fn extract_page(html: &str, filter: &LineTypeFilter) -> Vec<IpRecord> {
    let text = strip_markup(html);
    let records: Vec<IpRecord> = extract(&text, filter).collect();
    tracing::debug!(
        "Extracted {} record(s) from {} bytes of page text",
        records.len(),
        text.len()
    );
    records
}
