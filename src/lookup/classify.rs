//! Detail-table reading
//!
//! Property detail pages are a two-column table of headings and values.
//! Headings are matched by substring; "Contact Address" wins over
//! "Owner Mailing" when a heading carries both.

use crate::browser::{collapse_text, parse_selector};
use crate::model::PropertyRecord;
use crate::HarvestError;
use scraper::{Html, Selector};

/// The property fields a detail heading can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyField {
    OwnerMailing,
    ContactAddress,
    SiteAddress,
    City,
    ZipCode,
}

impl PropertyField {
    /// Stores `value` in the matching field of `record`
    pub fn set(self, record: &mut PropertyRecord, value: String) {
        let slot = match self {
            Self::OwnerMailing => &mut record.owner_mailing,
            Self::ContactAddress => &mut record.contact_address,
            Self::SiteAddress => &mut record.site_address,
            Self::City => &mut record.city,
            Self::ZipCode => &mut record.zip_code,
        };
        *slot = value;
    }
}

/// Maps a detail heading to the field it labels, if any
pub fn classify_heading(heading: &str) -> Option<PropertyField> {
    if heading.contains("Contact Address") {
        Some(PropertyField::ContactAddress)
    } else if heading.contains("Owner Mailing") {
        Some(PropertyField::OwnerMailing)
    } else if heading.contains("Site (Property) Address") {
        Some(PropertyField::SiteAddress)
    } else if heading.contains("City/Village") {
        Some(PropertyField::City)
    } else if heading.contains("Zip Code") {
        Some(PropertyField::ZipCode)
    } else {
        None
    }
}

/// Compiled selectors describing a detail table
#[derive(Debug, Clone)]
pub struct DetailLayout {
    row: Selector,
    heading: Selector,
    value: Selector,
}

impl DetailLayout {
    pub fn new(row: &str, heading: &str, value: &str) -> Result<Self, HarvestError> {
        Ok(Self {
            row: parse_selector(row)?,
            heading: parse_selector(heading)?,
            value: parse_selector(value)?,
        })
    }

    /// Reads every classified row of `html` into a property record
    ///
    /// Rows without both cells, rows with unknown headings and empty values
    /// are skipped; unmatched fields keep the sentinel. A later row with the
    /// same field replaces an earlier one.
    pub fn read(&self, html: &str) -> PropertyRecord {
        let document = Html::parse_document(html);
        let mut record = PropertyRecord::not_found();

        for row in document.select(&self.row) {
            let (Some(heading), Some(value)) = (
                row.select(&self.heading).next(),
                row.select(&self.value).next(),
            ) else {
                continue;
            };

            let heading = collapse_text(&heading);
            let Some(field) = classify_heading(&heading) else {
                tracing::trace!("Ignoring detail row '{}'", heading);
                continue;
            };

            let value = collapse_text(&value);
            if !value.is_empty() {
                field.set(&mut record, value);
            }
        }

        record
    }
}
