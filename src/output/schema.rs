//! Database schema for the run archive

/// SQL schema for the archive database
pub const SCHEMA_SQL: &str = r#"
-- One row per exported run
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    export_name TEXT NOT NULL,
    row_count INTEGER NOT NULL
);

-- The correlated table of each run, in export column order
CREATE TABLE IF NOT EXISTS correlated_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    name TEXT NOT NULL,
    date TEXT NOT NULL,
    source TEXT NOT NULL,
    age TEXT NOT NULL,
    location TEXT NOT NULL,
    owner_mailing TEXT NOT NULL,
    contact_address TEXT NOT NULL,
    site_address TEXT NOT NULL,
    city TEXT NOT NULL,
    zip_code TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_run ON correlated_records(run_id);
CREATE INDEX IF NOT EXISTS idx_records_name ON correlated_records(last_name, first_name);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
