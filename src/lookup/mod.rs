//! Property-records lookup
//!
//! This module resolves a person's name pair to a `PropertyRecord`:
//! - `PropertyResolver` drives the search, result-list and detail pages
//! - `DetailLayout` reads the heading/value table of a detail page
//! - `LookupOutcome` keeps "no match" apart from "lookup broke" for reporting

mod classify;
mod resolver;

pub use classify::{classify_heading, DetailLayout, PropertyField};
pub use resolver::{LookupOutcome, LookupSettings, PropertyResolver};
