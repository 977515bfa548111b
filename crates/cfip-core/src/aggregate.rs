//! Aggregator
//!
//! Merges per-source record lists into one deduplicated master list, ordered
//! by line rank and then by address (numeric for dotted quads).

use crate::model::IpRecord;
use std::collections::HashSet;

/// Flatten, deduplicate by `address#line_type`, and sort.
///
/// The result does not depend on the order of `sources` or of records within
/// them.
pub fn aggregate<S, I>(sources: S) -> Vec<IpRecord>
where
    S: IntoIterator<Item = I>,
    I: IntoIterator<Item = IpRecord>,
{
    let mut seen = HashSet::new();
    let mut merged: Vec<IpRecord> = sources
        .into_iter()
        .flatten()
        .filter(|record| seen.insert(record.key()))
        .collect();

    merged.sort_by(IpRecord::sort_cmp);
    merged
}
