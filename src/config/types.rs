use crate::model::Source;
use serde::Deserialize;

/// Main configuration structure for Obit-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub lookup: LookupConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
}

/// Scroll-harvest behavior shared by all sources
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HarvestConfig {
    /// Base distance scrolled per round (pixels)
    pub scroll_step: u32,

    /// Extra random distance added to each step (pixels, 0 = fixed step)
    pub scroll_jitter: u32,

    /// Wait after each scroll for lazy content to mount (milliseconds)
    pub settle_delay_ms: u64,

    /// Consecutive extraction passes without new records before stopping
    pub stagnant_threshold: u32,

    /// Hard cap on scroll rounds per source
    pub max_scroll_rounds: u32,

    /// How long to wait for the listing root element (milliseconds)
    pub load_timeout_ms: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            scroll_step: 500,
            scroll_jitter: 0,
            settle_delay_ms: 1000,
            stagnant_threshold: 3,
            max_scroll_rounds: 200,
            load_timeout_ms: 10_000,
        }
    }
}

/// Bounded-retry settings for page loads and lookups
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RetryConfig {
    /// Retries after the first failed attempt
    pub max_retries: u32,

    /// Lower bound of the delay between attempts (milliseconds)
    pub min_delay_ms: u64,

    /// Upper bound of the delay between attempts (milliseconds)
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay_ms: 2000,
            max_delay_ms: 5000,
        }
    }
}

/// Property-records lookup site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LookupConfig {
    /// URL of the owner search form
    pub search_url: String,

    /// Selector of the query input on the search form
    #[serde(default = "default_query_input")]
    pub query_input: String,

    /// Text shown when a search matches nothing
    #[serde(default = "default_no_results_text")]
    pub no_results_text: String,

    /// Substring of the location that identifies a multi-result listing
    #[serde(default = "default_result_list_marker")]
    pub result_list_marker: String,

    /// Selector of a row in the multi-result listing
    #[serde(default = "default_result_row")]
    pub result_row: String,

    /// Selector of a row in the detail table
    #[serde(default = "default_detail_row")]
    pub detail_row: String,

    /// Selector of the heading cell inside a detail row
    #[serde(default = "default_heading_cell")]
    pub heading_cell: String,

    /// Selector of the value cell inside a detail row
    #[serde(default = "default_value_cell")]
    pub value_cell: String,

    /// Number of parallel lookup workers, each with its own page session
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// How long to wait for form elements and result rows (milliseconds)
    #[serde(default = "default_element_timeout_ms")]
    pub element_timeout_ms: u64,

    /// Wait after submitting a search or opening a result (milliseconds)
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Minimum interval between lookups on one worker (milliseconds)
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Maximum interval between lookups on one worker (milliseconds)
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
}

fn default_query_input() -> String {
    "#inpOwner".to_string()
}

fn default_no_results_text() -> String {
    "Your search did not find any records".to_string()
}

fn default_result_list_marker() -> String {
    "CommonSearch.aspx?mode=OWNER".to_string()
}

fn default_result_row() -> String {
    "tr.SearchResults".to_string()
}

fn default_detail_row() -> String {
    "tr".to_string()
}

fn default_heading_cell() -> String {
    ".DataletSideHeading".to_string()
}

fn default_value_cell() -> String {
    ".DataletData".to_string()
}

fn default_workers() -> u32 {
    3
}

fn default_element_timeout_ms() -> u64 {
    10_000
}

fn default_settle_delay_ms() -> u64 {
    2000
}

fn default_min_interval_ms() -> u64 {
    2000
}

fn default_max_interval_ms() -> u64 {
    4000
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the harvester
    pub crawler_name: String,

    /// Version of the harvester
    pub crawler_version: String,

    /// URL with information about the harvester
    pub contact_url: String,

    /// Email address for harvester-related contact
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory the CSV export is written to
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// Prefix of the export file name; the run date is appended
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Optional SQLite archive that every run is appended to
    #[serde(default)]
    pub database_path: Option<String>,
}

fn default_output_directory() -> String {
    ".".to_string()
}

fn default_file_prefix() -> String {
    "obituaries_with_property".to_string()
}

/// One obituary listing to harvest
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceConfig {
    /// Which listing site this is
    pub kind: Source,

    /// Listing URL
    pub url: String,

    /// Element whose presence means the listing has rendered
    #[serde(default = "default_root_selector")]
    pub root_selector: String,

    /// Elements carrying a listing date; names below inherit it
    pub date_selector: String,

    /// Elements carrying a person's displayed name
    pub name_selector: String,

    /// Card enclosing one name with its age and location
    #[serde(default)]
    pub card_selector: Option<String>,

    /// Age element inside a card
    #[serde(default)]
    pub age_selector: Option<String>,

    /// Text stripped from the front of the age (e.g. "Age ")
    #[serde(default)]
    pub age_prefix: Option<String>,

    /// Location element inside a card
    #[serde(default)]
    pub location_selector: Option<String>,

    /// Location used when a card carries none
    #[serde(default)]
    pub default_location: Option<String>,

    /// Popup close buttons tried in order after loading; the first that
    /// clicks ends dismissal
    #[serde(default)]
    pub dismiss_selectors: Vec<String>,
}

fn default_root_selector() -> String {
    "body".to_string()
}
