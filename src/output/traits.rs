//! Export sink trait and types
//!
//! This module defines the interface the pipeline hands its final table to,
//! along with the errors sinks can report.

use crate::model::CorrelatedRecord;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during export
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Where an export ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    /// File path or database location written to
    pub location: String,

    /// Number of data rows written
    pub rows: usize,
}

/// Trait for export destinations
///
/// Sinks receive the whole correlated table at once. Implementations must be
/// thread-safe.
pub trait ExportSink: Send + Sync {
    /// Short label used in log lines
    fn label(&self) -> &str;

    /// Writes `records` under the export name `name`
    ///
    /// # Arguments
    ///
    /// * `records` - The correlated table, one row per obituary
    /// * `name` - Export name, e.g. `obituaries_with_property_03_05_24.csv`
    fn write(&self, records: &[CorrelatedRecord], name: &str) -> OutputResult<ExportReceipt>;
}

/// Writes through `primary`, falling back to `fallback` if it fails
///
/// Returns the receipt of whichever sink accepted the table.
pub fn write_with_fallback(
    records: &[CorrelatedRecord],
    name: &str,
    primary: &dyn ExportSink,
    fallback: &dyn ExportSink,
) -> OutputResult<ExportReceipt> {
    match primary.write(records, name) {
        Ok(receipt) => Ok(receipt),
        Err(e) => {
            tracing::warn!(
                "Export to {} failed: {}; falling back to {}",
                primary.label(),
                e,
                fallback.label()
            );
            fallback.write(records, name)
        }
    }
}

/// Builds the export name for a run on `date`: `{prefix}_{MM_DD_YY}.csv`
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.csv", prefix, date.format("%m_%d_%y"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            export_file_name("obituaries_with_property", date),
            "obituaries_with_property_03_05_24.csv"
        );
    }

    struct FixedSink {
        label: &'static str,
        fail: bool,
    }

    impl ExportSink for FixedSink {
        fn label(&self) -> &str {
            self.label
        }

        fn write(&self, records: &[CorrelatedRecord], name: &str) -> OutputResult<ExportReceipt> {
            if self.fail {
                return Err(OutputError::Write("unreachable host".to_string()));
            }
            Ok(ExportReceipt {
                location: format!("{}/{}", self.label, name),
                rows: records.len(),
            })
        }
    }

    #[test]
    fn test_primary_sink_used_when_it_succeeds() {
        let primary = FixedSink { label: "primary", fail: false };
        let fallback = FixedSink { label: "local", fail: false };

        let receipt = write_with_fallback(&[], "out.csv", &primary, &fallback).unwrap();

        assert_eq!(receipt.location, "primary/out.csv");
    }

    #[test]
    fn test_falls_back_when_primary_fails() {
        let primary = FixedSink { label: "primary", fail: true };
        let fallback = FixedSink { label: "local", fail: false };

        let receipt = write_with_fallback(&[], "out.csv", &primary, &fallback).unwrap();

        assert_eq!(receipt.location, "local/out.csv");
    }

    #[test]
    fn test_both_sinks_failing_reports_error() {
        let primary = FixedSink { label: "primary", fail: true };
        let fallback = FixedSink { label: "local", fail: true };

        assert!(write_with_fallback(&[], "out.csv", &primary, &fallback).is_err());
    }

    #[test]
    fn test_output_error_display() {
        let err = OutputError::Write("disk full".to_string());
        assert_eq!(err.to_string(), "Failed to write output: disk full");
    }
}
