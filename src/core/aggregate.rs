//! Merging per-group results.
//!
//! Tasks finish in no particular order; sorting newest-first here is the only
//! point where the merged output gets a deterministic order. Duplicates are
//! kept as they are.

use crate::MatchRecord;

/// Collects match lists from all tasks.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    matches: Vec<MatchRecord>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one task's matches.
    pub fn extend(&mut self, matches: impl IntoIterator<Item = MatchRecord>) {
        self.matches.extend(matches);
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Returns all matches sorted by timestamp, newest first.
    ///
    /// The sort is stable, so equal timestamps keep their arrival order.
    pub fn finish(mut self) -> Vec<MatchRecord> {
        self.matches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.matches
    }
}

/// Merges match lists and sorts them newest first.
pub fn aggregate<I>(groups: I) -> Vec<MatchRecord>
where
    I: IntoIterator<Item = Vec<MatchRecord>>,
{
    let mut aggregator = ResultAggregator::new();
    for group in groups {
        aggregator.extend(group);
    }
    aggregator.finish()
}
