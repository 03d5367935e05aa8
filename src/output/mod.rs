//! Output module for exporting correlated tables
//!
//! This module handles:
//! - The `ExportSink` interface the pipeline writes through
//! - Local CSV export, also used as the fallback sink
//! - An optional SQLite archive of every run
//! - Export file naming

mod csv_sink;
mod schema;
mod sqlite_sink;
mod traits;

pub use csv_sink::CsvFileSink;
pub use sqlite_sink::{ArchivedRun, SqliteSink};
pub use traits::{
    export_file_name, write_with_fallback, ExportReceipt, ExportSink, OutputError, OutputResult,
};
