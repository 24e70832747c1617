use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::builder::build_me_entries;
use super::constants::{DEFAULT_EMPTY_THRESHOLD, LEGACY_EMPTY_THRESHOLD};
use super::error::BuilderError;
use super::me_ids::MEIdTable;
use super::record::HistogramRecord;

/// When a lumisection counts as empty.
///
/// `AtOrBelow(0)` is the one MEData uses. `Below(10)` is the looser check of the quick
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyCriterion {
    AtOrBelow(u64),
    Below(u64),
}

impl Default for EmptyCriterion {
    fn default() -> Self {
        Self::AtOrBelow(DEFAULT_EMPTY_THRESHOLD)
    }
}

impl EmptyCriterion {
    pub fn legacy() -> Self {
        Self::Below(LEGACY_EMPTY_THRESHOLD)
    }

    pub fn is_empty(&self, entries: u64) -> bool {
        match self {
            Self::AtOrBelow(threshold) => entries <= *threshold,
            Self::Below(threshold) => entries < *threshold,
        }
    }
}

/// Return the 1-based lumisection numbers whose entry count is at or below threshold
pub fn classify<'a, I>(entries: I, threshold: u64) -> Vec<u32>
where
    I: IntoIterator<Item = &'a u64>,
{
    classify_with(entries, EmptyCriterion::AtOrBelow(threshold))
}

/// Return the 1-based lumisection numbers that are empty under the given criterion
pub fn classify_with<'a, I>(entries: I, criterion: EmptyCriterion) -> Vec<u32>
where
    I: IntoIterator<Item = &'a u64>,
{
    entries
        .into_iter()
        .enumerate()
        .filter(|(_, n)| criterion.is_empty(**n))
        .map(|(idx, _)| (idx + 1) as u32)
        .collect()
}

/// Standalone diagnostic: the empty lumisections of every ME in a raw record table
pub fn check_empty_lumisections(
    records: &[HistogramRecord],
    table: &MEIdTable,
    criterion: EmptyCriterion,
) -> Result<BTreeMap<String, Vec<u32>>, BuilderError> {
    let entries = build_me_entries(records, table)?;
    Ok(entries
        .into_iter()
        .map(|(name, entry)| (name, classify_with(&entry.entries, criterion)))
        .collect())
}
