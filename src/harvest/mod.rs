//! Obituary listing harvest
//!
//! This module turns a configured listing into obituary records:
//! - `SourceProfile` compiles a source's selectors once
//! - `extract_entries` folds date markers and names in document order
//! - `ScrollHarvester` scrolls the listing until it stops producing records

mod extract;
mod harvester;

pub use extract::{extract_entries, ListingEntry, SourceProfile};
pub use harvester::{HarvestReport, HarvestSettings, HarvestState, ScrollHarvester, StopReason};
