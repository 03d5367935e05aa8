use serde::Deserialize;
use std::fmt;

/// Sentinel for a property field the lookup could not resolve
pub const NOT_ON_AUDITOR: &str = "NOTONAUDITOR";

/// Placeholder for obituary fields a listing does not carry
pub const NOT_AVAILABLE: &str = "N/A";

/// Column order of the exported table
pub const EXPORT_COLUMNS: [&str; 12] = [
    "first_name",
    "last_name",
    "name",
    "date",
    "source",
    "age",
    "location",
    "owner_mailing",
    "contact_address",
    "site_address",
    "city",
    "zip_code",
];

/// The obituary listing site a record was harvested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    SiteA,
    SiteB,
}

impl Source {
    /// Returns the label written to the `source` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SiteA => "site-a",
            Self::SiteB => "site-b",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplication key used across the whole run: `(full_name, source)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameSourceKey {
    pub full_name: String,
    pub source: Source,
}

/// Deduplication key used between scroll passes of one harvest
///
/// Looser than [`NameSourceKey`] so a person seen again in a later frame is
/// recognised even when the listing reformats the displayed name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScrollKey {
    pub first_name: String,
    pub last_name: String,
    pub date: String,
    pub source: Source,
}

/// The `(first_name, last_name)` pair property lookups are keyed by
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamePair {
    pub first_name: String,
    pub last_name: String,
}

impl NamePair {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Query string typed into the lookup form: last name first
    pub fn search_query(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }
}

impl fmt::Display for NamePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// One obituary listing entry, immutable once harvested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObituaryRecord {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub date: String,
    pub source: Source,
    pub age: String,
    pub location: String,
}

impl ObituaryRecord {
    pub fn name_source_key(&self) -> NameSourceKey {
        NameSourceKey {
            full_name: self.full_name.clone(),
            source: self.source,
        }
    }

    pub fn scroll_key(&self) -> ScrollKey {
        ScrollKey {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date: self.date.clone(),
            source: self.source,
        }
    }

    pub fn name_pair(&self) -> NamePair {
        NamePair::new(self.first_name.clone(), self.last_name.clone())
    }
}

/// Property details for one person; unresolved fields hold [`NOT_ON_AUDITOR`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRecord {
    pub owner_mailing: String,
    pub contact_address: String,
    pub site_address: String,
    pub city: String,
    pub zip_code: String,
}

impl PropertyRecord {
    /// The all-sentinel record, used for both "no match" and failed lookups
    pub fn not_found() -> Self {
        Self {
            owner_mailing: NOT_ON_AUDITOR.to_string(),
            contact_address: NOT_ON_AUDITOR.to_string(),
            site_address: NOT_ON_AUDITOR.to_string(),
            city: NOT_ON_AUDITOR.to_string(),
            zip_code: NOT_ON_AUDITOR.to_string(),
        }
    }

    /// Returns true when every field still holds the sentinel
    pub fn is_not_found(&self) -> bool {
        self.fields().iter().all(|f| *f == NOT_ON_AUDITOR)
    }

    /// Returns true when an owner mailing address was resolved
    pub fn has_owner_mailing(&self) -> bool {
        self.owner_mailing != NOT_ON_AUDITOR
    }

    pub fn fields(&self) -> [&str; 5] {
        [
            &self.owner_mailing,
            &self.contact_address,
            &self.site_address,
            &self.city,
            &self.zip_code,
        ]
    }
}

impl Default for PropertyRecord {
    fn default() -> Self {
        Self::not_found()
    }
}

/// An obituary joined with the property record found for its name pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelatedRecord {
    pub obituary: ObituaryRecord,
    pub property: PropertyRecord,
}

impl CorrelatedRecord {
    pub fn new(obituary: ObituaryRecord, property: PropertyRecord) -> Self {
        Self { obituary, property }
    }

    /// Row values in [`EXPORT_COLUMNS`] order
    pub fn to_row(&self) -> [&str; 12] {
        let o = &self.obituary;
        let p = &self.property;
        [
            &o.first_name,
            &o.last_name,
            &o.full_name,
            &o.date,
            o.source.as_str(),
            &o.age,
            &o.location,
            &p.owner_mailing,
            &p.contact_address,
            &p.site_address,
            &p.city,
            &p.zip_code,
        ]
    }
}
