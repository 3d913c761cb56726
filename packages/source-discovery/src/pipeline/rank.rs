//! Dedup / rank - merge sources across phases and order them by score.

use indexmap::IndexMap;
use std::cmp::Ordering;

use crate::types::source::Source;

/// Merge sources that share a normalized URL.
///
/// First-seen order is preserved. On collision the surviving record keeps
/// the higher score and the OR of the boolean flags.
pub fn deduplicate(sources: Vec<Source>) -> Vec<Source> {
    let mut merged: IndexMap<String, Source> = IndexMap::with_capacity(sources.len());

    for source in sources {
        match merged.entry(source.key()) {
            indexmap::map::Entry::Occupied(mut entry) => entry.get_mut().merge(source),
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(source);
            }
        }
    }

    merged.into_values().collect()
}

/// Sort by descending score. Stable; order among equal scores is input
/// order.
pub fn rank(mut sources: Vec<Source>) -> Vec<Source> {
    sources.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    sources
}

/// Deduplicate then rank.
pub fn dedupe_and_rank(sources: Vec<Source>) -> Vec<Source> {
    rank(deduplicate(sources))
}

/// Raise every official campaign source to `floor`.
pub fn pin_official(sources: &mut [Source], floor: f32) {
    for source in sources.iter_mut().filter(|s| s.is_official_campaign) {
        source.raise_score_to(floor);
    }
}
