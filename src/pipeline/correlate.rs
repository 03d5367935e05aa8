//! Deduplication and joining of harvested records

use crate::model::{CorrelatedRecord, NamePair, ObituaryRecord, PropertyRecord};
use std::collections::{HashMap, HashSet};

/// Drops records whose `(full_name, source)` was already seen, keeping the first
pub fn dedup_by_name_source(records: Vec<ObituaryRecord>) -> Vec<ObituaryRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.name_source_key()))
        .collect()
}

/// Returns each distinct `(first_name, last_name)` pair once, in first-seen order
pub fn distinct_name_pairs(records: &[ObituaryRecord]) -> Vec<NamePair> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(ObituaryRecord::name_pair)
        .filter(|pair| seen.insert(pair.clone()))
        .collect()
}

/// Joins every record to the property found for its name pair
///
/// Pairs missing from `properties` get the all-sentinel record.
pub fn correlate(
    records: Vec<ObituaryRecord>,
    properties: &HashMap<NamePair, PropertyRecord>,
) -> Vec<CorrelatedRecord> {
    records
        .into_iter()
        .map(|record| {
            let property = properties
                .get(&record.name_pair())
                .cloned()
                .unwrap_or_default();
            CorrelatedRecord::new(record, property)
        })
        .collect()
}
