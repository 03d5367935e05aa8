//! Local CSV export
//!
//! The file sink is also the fallback when the primary sink fails.

use crate::model::{CorrelatedRecord, EXPORT_COLUMNS};
use crate::output::traits::{ExportReceipt, ExportSink, OutputResult};
use std::path::{Path, PathBuf};

/// Writes the table as a CSV file inside a directory
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    directory: PathBuf,
}

impl CsvFileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl ExportSink for CsvFileSink {
    fn label(&self) -> &str {
        "csv"
    }

    fn write(&self, records: &[CorrelatedRecord], name: &str) -> OutputResult<ExportReceipt> {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(name);

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(EXPORT_COLUMNS)?;
        for record in records {
            writer.write_record(record.to_row())?;
        }
        writer.flush()?;

        tracing::info!("Wrote {} rows to {}", records.len(), path.display());

        Ok(ExportReceipt {
            location: path.display().to_string(),
            rows: records.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObituaryRecord, PropertyRecord, Source};
    use tempfile::TempDir;

    fn record(first: &str, last: &str) -> CorrelatedRecord {
        CorrelatedRecord::new(
            ObituaryRecord {
                first_name: first.to_string(),
                last_name: last.to_string(),
                full_name: format!("{} {}", first, last),
                date: "Jan 1, 2024".to_string(),
                source: Source::SiteA,
                age: "N/A".to_string(),
                location: "Ohio".to_string(),
            },
            PropertyRecord::not_found(),
        )
    }

    #[test]
    fn test_writes_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let sink = CsvFileSink::new(dir.path());

        let receipt = sink
            .write(&[record("John", "Smith"), record("Jane", "Doe")], "out.csv")
            .unwrap();

        assert_eq!(receipt.rows, 2);
        let contents = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "first_name,last_name,name,date,source,age,location,owner_mailing,contact_address,site_address,city,zip_code"
        );
        assert!(lines[1].starts_with("John,Smith,John Smith,\"Jan 1, 2024\",site-a,N/A,Ohio,NOTONAUDITOR"));
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("exports").join("daily");
        let sink = CsvFileSink::new(&nested);

        sink.write(&[], "empty.csv").unwrap();

        let contents = std::fs::read_to_string(nested.join("empty.csv")).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
