//! Page access for harvesting and lookups
//!
//! This module defines the browsing collaborator the core drives:
//! - The `PageAccessor` trait (navigate, snapshot, scroll, wait, query, form input)
//! - Owned element snapshots returned by queries
//! - The `AccessorFactory` that hands each worker its own session
//! - `HttpPageAccessor`, a static-HTML implementation over reqwest + scraper
//!
//! A session is not safe to share between concurrent tasks: navigation
//! replaces the current document in place. Workers that run in parallel must
//! each open their own accessor through a factory.

mod document;
mod http;

pub(crate) use document::parse_selector;
pub use document::{collapse_text, document_mentions, select_snapshots};
pub use http::{build_http_client, HttpAccessorFactory, HttpPageAccessor};

use crate::HarvestError;
use async_trait::async_trait;
use scraper::ElementRef;
use std::collections::HashMap;
use std::time::Duration;

/// Owned copy of an element taken from the current document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSnapshot {
    /// Lower-case tag name
    pub tag: String,

    /// Text content with whitespace collapsed
    pub text: String,

    /// Attribute name/value pairs
    pub attributes: HashMap<String, String>,

    /// Inner HTML of the element
    pub inner_html: String,
}

impl ElementSnapshot {
    pub fn from_element(element: ElementRef<'_>) -> Self {
        let value = element.value();
        Self {
            tag: value.name().to_string(),
            text: collapse_text(&element),
            attributes: value
                .attrs()
                .map(|(name, v)| (name.to_string(), v.to_string()))
                .collect(),
            inner_html: element.inner_html(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// A single browsing session
///
/// Methods take `&self`; implementations keep session state behind interior
/// mutability so retry closures can call them repeatedly.
#[async_trait]
pub trait PageAccessor: Send + Sync {
    /// Loads `url`, replacing the current document
    async fn navigate(&self, url: &str) -> Result<(), HarvestError>;

    /// Returns the HTML of the currently rendered document
    async fn snapshot(&self) -> Result<String, HarvestError>;

    /// Scrolls the viewport down by `amount` pixels
    async fn scroll_by(&self, amount: u32) -> Result<(), HarvestError>;

    /// Returns the total scrollable height of the document in pixels
    async fn document_height(&self) -> Result<u64, HarvestError>;

    /// Waits until `selector` matches, returning the first match
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<ElementSnapshot, HarvestError>;

    /// Returns every element matching `selector`, in document order
    async fn find_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, HarvestError>;

    /// Returns the location of the current document
    async fn current_url(&self) -> Result<String, HarvestError>;

    /// Replaces the value of the input matching `selector`
    async fn fill(&self, selector: &str, text: &str) -> Result<(), HarvestError>;

    /// Submits the form that contains the element matching `selector`
    async fn submit(&self, selector: &str) -> Result<(), HarvestError>;

    /// Activates the first element matching `selector`
    async fn click(&self, selector: &str) -> Result<(), HarvestError>;
}

/// Opens independent browsing sessions
pub trait AccessorFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn PageAccessor>, HarvestError>;
}
