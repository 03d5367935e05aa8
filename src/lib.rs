//! Obit-Harvest: obituary harvesting and property-record correlation
//!
//! This crate harvests obituary listings from infinite-scroll pages, normalizes
//! the names it finds, looks each distinct person up on a property-records site,
//! and produces a merged, de-duplicated table for export.

pub mod browser;
pub mod config;
pub mod harvest;
pub mod lookup;
pub mod model;
pub mod names;
pub mod output;
pub mod pipeline;
pub mod retry;

use thiserror::Error;

/// Main error type for Obit-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Transient fetch failure for {url}: {message}")]
    TransientFetch { url: String, message: String },

    #[error("Timed out waiting for element '{selector}'")]
    ElementTimeout { selector: String },

    #[error("No page loaded")]
    NoPageLoaded,

    #[error("Element '{selector}' cannot be used for {action}")]
    UnsupportedAction { selector: String, action: String },

    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    RetryExhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Harvest of {listing} failed: {message}")]
    SourceHarvest { listing: String, message: String },

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Worker error: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Obit-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{CorrelatedRecord, ObituaryRecord, PropertyRecord, Source};
pub use names::{normalize_name, NormalizedName};
pub use pipeline::CorrelationPipeline;
