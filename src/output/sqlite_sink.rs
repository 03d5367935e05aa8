//! SQLite run archive
//!
//! Appends every exported table to a local database, one `runs` row per
//! export, so earlier runs stay queryable after the CSV files are gone.

use crate::model::CorrelatedRecord;
use crate::output::schema::initialize_schema;
use crate::output::traits::{ExportReceipt, ExportSink, OutputError, OutputResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// A run as recorded in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedRun {
    pub id: i64,
    pub started_at: String,
    pub finished_at: String,
    pub config_hash: String,
    pub export_name: String,
    pub row_count: i64,
}

/// Export sink backed by SQLite
pub struct SqliteSink {
    conn: Mutex<Connection>,
    location: String,
    config_hash: String,
    started_at: DateTime<Utc>,
}

impl SqliteSink {
    /// Opens (or creates) the archive at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `config_hash` - Hash of the configuration the run was started with
    /// * `started_at` - When the run started
    pub fn new(path: &Path, config_hash: &str, started_at: DateTime<Utc>) -> OutputResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            location: path.display().to_string(),
            config_hash: config_hash.to_string(),
            started_at,
        })
    }

    /// Creates an in-memory archive (for testing)
    #[cfg(test)]
    pub fn new_in_memory(config_hash: &str) -> OutputResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            location: ":memory:".to_string(),
            config_hash: config_hash.to_string(),
            started_at: Utc::now(),
        })
    }

    fn lock(&self) -> OutputResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock archive: {}", e)))
    }

    /// Returns the most recently archived run
    pub fn latest_run(&self) -> OutputResult<Option<ArchivedRun>> {
        let conn = self.lock()?;
        let run = conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, export_name, row_count
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(ArchivedRun {
                        id: row.get(0)?,
                        started_at: row.get(1)?,
                        finished_at: row.get(2)?,
                        config_hash: row.get(3)?,
                        export_name: row.get(4)?,
                        row_count: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(run)
    }

    /// Returns how many records were archived for `run_id`
    pub fn record_count(&self, run_id: i64) -> OutputResult<i64> {
        let conn = self.lock()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM correlated_records WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl ExportSink for SqliteSink {
    fn label(&self) -> &str {
        "sqlite"
    }

    fn write(&self, records: &[CorrelatedRecord], name: &str) -> OutputResult<ExportReceipt> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO runs (started_at, finished_at, config_hash, export_name, row_count)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.started_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
                self.config_hash,
                name,
                records.len() as i64
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO correlated_records (run_id, first_name, last_name, name, date,
                 source, age, location, owner_mailing, contact_address, site_address, city, zip_code)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;
            for record in records {
                let [first, last, full, date, source, age, location, mailing, contact, site, city, zip] =
                    record.to_row();
                stmt.execute(params![
                    run_id, first, last, full, date, source, age, location, mailing, contact,
                    site, city, zip
                ])?;
            }
        }

        tx.commit()?;
        tracing::info!("Archived run {} ({} rows) in {}", run_id, records.len(), self.location);

        Ok(ExportReceipt {
            location: format!("{}#run={}", self.location, run_id),
            rows: records.len(),
        })
    }
}
