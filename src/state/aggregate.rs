/// Status Aggregator
///
/// Per-status counts of the loaded result set for the summary bar.
/// Always rebuilt from scratch, never updated incrementally.
use std::collections::BTreeMap;

use super::data::{Concern, ConcernStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCounts {
    counts: BTreeMap<ConcernStatus, usize>,
}

impl StatusCounts {
    /// Count every concern once; unrecognized statuses land in `Unknown`
    pub fn from_concerns(concerns: &[Concern]) -> Self {
        let mut counts = BTreeMap::new();
        for concern in concerns {
            *counts.entry(concern.status).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn get(&self, status: ConcernStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Non-empty buckets in status order
    pub fn iter(&self) -> impl Iterator<Item = (ConcernStatus, usize)> + '_ {
        self.counts.iter().map(|(status, count)| (*status, *count))
    }
}
