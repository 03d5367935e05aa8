//! Person-name normalization
//!
//! Listing sites display names with life spans, dates, nicknames, titles and
//! generational suffixes mixed in. This module reduces such a display string
//! to the first/last name pair used for lookups and a canonical full name.

mod normalize;

pub use normalize::{normalize_name, NormalizedName};
