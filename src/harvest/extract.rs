//! Listing extraction
//!
//! Walks the date markers and name elements of a rendered listing in document
//! order. Each name inherits the most recent date marker above it; names
//! before the first marker are skipped.

use crate::browser::{collapse_text, parse_selector};
use crate::config::SourceConfig;
use crate::model::{Source, NOT_AVAILABLE};
use crate::HarvestError;
use scraper::{ElementRef, Html, Selector};

/// Compiled extraction rules for one source
#[derive(Debug, Clone)]
pub struct SourceProfile {
    pub kind: Source,
    pub url: String,
    pub root_selector: String,
    pub dismiss_selectors: Vec<String>,
    date: Selector,
    markers: Selector,
    card: Option<Selector>,
    age: Option<Selector>,
    age_prefix: Option<String>,
    location: Option<Selector>,
    default_location: Option<String>,
}

impl SourceProfile {
    /// Compiles the selectors of a configured source
    pub fn from_config(config: &SourceConfig) -> Result<Self, HarvestError> {
        let combined = format!("{}, {}", config.date_selector, config.name_selector);

        Ok(Self {
            kind: config.kind,
            url: config.url.clone(),
            root_selector: config.root_selector.clone(),
            dismiss_selectors: config.dismiss_selectors.clone(),
            date: parse_selector(&config.date_selector)?,
            markers: parse_selector(&combined)?,
            card: config.card_selector.as_deref().map(parse_selector).transpose()?,
            age: config.age_selector.as_deref().map(parse_selector).transpose()?,
            age_prefix: config.age_prefix.clone(),
            location: config.location_selector.as_deref().map(parse_selector).transpose()?,
            default_location: config.default_location.clone(),
        })
    }
}

/// A name found on the listing together with the fields around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub raw_name: String,
    pub date: String,
    pub age: String,
    pub location: String,
}

/// Extracts every dated name entry from a listing document, in document order
pub fn extract_entries(html: &str, profile: &SourceProfile) -> Vec<ListingEntry> {
    let document = Html::parse_document(html);

    let mut current_date: Option<String> = None;
    let mut entries = Vec::new();

    for element in document.select(&profile.markers) {
        if profile.date.matches(&element) {
            let text = collapse_text(&element);
            current_date = (!text.is_empty()).then_some(text);
            continue;
        }

        let Some(date) = &current_date else {
            continue;
        };

        let raw_name = collapse_text(&element);
        if raw_name.is_empty() {
            continue;
        }

        let card = enclosing_card(&element, profile);
        entries.push(ListingEntry {
            raw_name,
            date: date.clone(),
            age: read_age(card.as_ref(), profile),
            location: read_location(card.as_ref(), profile),
        });
    }

    entries
}

fn enclosing_card<'a>(element: &ElementRef<'a>, profile: &SourceProfile) -> Option<ElementRef<'a>> {
    let card = profile.card.as_ref()?;
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| card.matches(ancestor))
}

fn first_text(card: Option<&ElementRef<'_>>, selector: Option<&Selector>) -> Option<String> {
    let (card, selector) = (card?, selector?);
    card.select(selector)
        .next()
        .map(|e| collapse_text(&e))
        .filter(|t| !t.is_empty())
}

fn read_age(card: Option<&ElementRef<'_>>, profile: &SourceProfile) -> String {
    first_text(card, profile.age.as_ref())
        .map(|age| match &profile.age_prefix {
            Some(prefix) => age
                .strip_prefix(prefix.as_str())
                .unwrap_or(&age)
                .trim()
                .to_string(),
            None => age,
        })
        .filter(|age| !age.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn read_location(card: Option<&ElementRef<'_>>, profile: &SourceProfile) -> String {
    first_text(card, profile.location.as_ref())
        .or_else(|| profile.default_location.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
