//! Run statistics printed at the end of a run

use crate::harvest::HarvestReport;
use crate::lookup::LookupOutcome;
use crate::model::{CorrelatedRecord, Source};
use std::collections::BTreeMap;
use std::fmt;

/// What one source's harvest produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub source: Source,
    pub harvested: usize,
    pub rounds: u32,
    pub stop_reason: String,
    pub error: Option<String>,
}

impl From<&HarvestReport> for SourceSummary {
    fn from(report: &HarvestReport) -> Self {
        Self {
            source: report.source,
            harvested: report.records.len(),
            rounds: report.rounds,
            stop_reason: report.stop_reason.to_string(),
            error: report.error.as_ref().map(ToString::to_string),
        }
    }
}

/// Statistics for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sources: Vec<SourceSummary>,

    /// Records left per source after deduplication
    pub records_by_source: BTreeMap<Source, usize>,
    pub duplicates_dropped: usize,

    pub distinct_pairs: usize,
    pub lookups_matched: usize,
    pub lookups_not_found: usize,
    pub lookups_failed: usize,

    pub with_owner_mailing: usize,
    pub without_owner_mailing: usize,
}

impl RunSummary {
    pub fn total_records(&self) -> usize {
        self.records_by_source.values().sum()
    }

    pub fn lookups(&self) -> usize {
        self.lookups_matched + self.lookups_not_found + self.lookups_failed
    }

    pub(crate) fn count_outcome(&mut self, outcome: &LookupOutcome) {
        match outcome {
            LookupOutcome::Matched(_) => self.lookups_matched += 1,
            LookupOutcome::NotFound => self.lookups_not_found += 1,
            LookupOutcome::Failed(_) => self.lookups_failed += 1,
        }
    }

    pub(crate) fn count_table(&mut self, table: &[CorrelatedRecord]) {
        self.records_by_source.clear();
        self.with_owner_mailing = 0;
        self.without_owner_mailing = 0;

        for row in table {
            *self
                .records_by_source
                .entry(row.obituary.source)
                .or_insert(0) += 1;
            if row.property.has_owner_mailing() {
                self.with_owner_mailing += 1;
            } else {
                self.without_owner_mailing += 1;
            }
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Run Summary ===")?;
        writeln!(f)?;

        writeln!(f, "Harvest:")?;
        for source in &self.sources {
            write!(
                f,
                "  {}: {} records, {} rounds ({})",
                source.source, source.harvested, source.rounds, source.stop_reason
            )?;
            if let Some(error) = &source.error {
                write!(f, " - {}", error)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  Duplicates dropped: {}", self.duplicates_dropped)?;
        writeln!(f)?;

        writeln!(f, "Records: {}", self.total_records())?;
        for (source, count) in &self.records_by_source {
            writeln!(f, "  {}: {}", source, count)?;
        }
        writeln!(f)?;

        writeln!(f, "Property lookups: {} distinct names", self.distinct_pairs)?;
        writeln!(f, "  Matched: {}", self.lookups_matched)?;
        writeln!(f, "  Not found: {}", self.lookups_not_found)?;
        writeln!(f, "  Failed: {}", self.lookups_failed)?;
        writeln!(f)?;

        writeln!(f, "With owner mailing: {}", self.with_owner_mailing)?;
        write!(f, "Without owner mailing: {}", self.without_owner_mailing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObituaryRecord, PropertyRecord};

    fn row(source: Source, mailing: Option<&str>) -> CorrelatedRecord {
        let mut property = PropertyRecord::not_found();
        if let Some(mailing) = mailing {
            property.owner_mailing = mailing.to_string();
        }
        CorrelatedRecord::new(
            ObituaryRecord {
                first_name: "John".to_string(),
                last_name: "Smith".to_string(),
                full_name: "John Smith".to_string(),
                date: "Jan 1, 2024".to_string(),
                source,
                age: "N/A".to_string(),
                location: "Ohio".to_string(),
            },
            property,
        )
    }

    #[test]
    fn test_count_table() {
        let mut summary = RunSummary::default();
        summary.count_table(&[
            row(Source::SiteA, Some("PO BOX 9")),
            row(Source::SiteA, None),
            row(Source::SiteB, None),
        ]);

        assert_eq!(summary.total_records(), 3);
        assert_eq!(summary.records_by_source[&Source::SiteA], 2);
        assert_eq!(summary.with_owner_mailing, 1);
        assert_eq!(summary.without_owner_mailing, 2);
    }

    #[test]
    fn test_count_outcomes() {
        let mut summary = RunSummary::default();
        summary.count_outcome(&LookupOutcome::NotFound);
        summary.count_outcome(&LookupOutcome::Failed("timeout".to_string()));
        summary.count_outcome(&LookupOutcome::Matched(PropertyRecord::not_found()));

        assert_eq!(summary.lookups(), 3);
        assert_eq!(summary.lookups_failed, 1);
    }

    #[test]
    fn test_display_mentions_sources() {
        let mut summary = RunSummary::default();
        summary.sources.push(SourceSummary {
            source: Source::SiteB,
            harvested: 0,
            rounds: 0,
            stop_reason: "load failed".to_string(),
            error: Some("timeout".to_string()),
        });

        let text = summary.to_string();
        assert!(text.contains("site-b: 0 records, 0 rounds (load failed) - timeout"));
        assert!(text.contains("Without owner mailing: 0"));
    }
}
