//! Record types shared by the harvesting, lookup and export stages
//!
//! This module defines:
//! - The obituary source enumeration
//! - Harvested obituary records and their deduplication keys
//! - Property records with the "not on auditor" sentinel
//! - The correlated row handed to export sinks

mod records;

pub use records::{
    CorrelatedRecord, NamePair, NameSourceKey, ObituaryRecord, PropertyRecord, ScrollKey, Source,
    EXPORT_COLUMNS, NOT_AVAILABLE, NOT_ON_AUDITOR,
};
