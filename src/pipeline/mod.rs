//! Correlation pipeline
//!
//! This module ties the stages together:
//! - Harvest every source and deduplicate on `(full_name, source)`
//! - Resolve each distinct `(first_name, last_name)` pair once
//! - Join records to properties and collect run statistics
//!
//! Exporting the table is left to the caller, which decides on fallbacks.

mod correlate;
mod runner;
mod summary;

pub use correlate::{correlate, dedup_by_name_source, distinct_name_pairs};
pub use runner::{CorrelationPipeline, PipelineRun};
pub use summary::{RunSummary, SourceSummary};
