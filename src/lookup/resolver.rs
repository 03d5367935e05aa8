//! Per-person property lookup
//!
//! `Searching -> (NoResults | ResultList) -> Detail -> Extracted`. A search
//! that lands directly on a detail page skips `ResultList`.

use crate::browser::{document_mentions, PageAccessor};
use crate::config::LookupConfig;
use crate::lookup::classify::DetailLayout;
use crate::model::{NamePair, PropertyRecord};
use crate::retry::{DelayRange, RateLimiter, RetryPolicy};
use crate::HarvestError;
use std::fmt;
use std::time::Duration;

/// Lookup-site behavior shared by every worker
#[derive(Debug, Clone)]
pub struct LookupSettings {
    pub search_url: String,
    pub query_input: String,
    pub no_results_text: String,
    pub result_list_marker: String,
    pub result_row: String,
    pub element_timeout: Duration,
    pub settle_delay: Duration,
    pub pacing: DelayRange,
    layout: DetailLayout,
}

impl LookupSettings {
    pub fn from_config(config: &LookupConfig) -> Result<Self, HarvestError> {
        Ok(Self {
            search_url: config.search_url.clone(),
            query_input: config.query_input.clone(),
            no_results_text: config.no_results_text.clone(),
            result_list_marker: config.result_list_marker.clone(),
            result_row: config.result_row.clone(),
            element_timeout: Duration::from_millis(config.element_timeout_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            pacing: DelayRange::from_millis(config.min_interval_ms, config.max_interval_ms),
            layout: DetailLayout::new(
                &config.detail_row,
                &config.heading_cell,
                &config.value_cell,
            )?,
        })
    }

    fn is_result_list(&self, url: &str) -> bool {
        url.to_lowercase()
            .contains(&self.result_list_marker.to_lowercase())
    }
}

/// What a lookup found
///
/// `NotFound` and `Failed` both collapse to the all-sentinel record through
/// [`LookupOutcome::into_record`]; they are kept apart here for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// At least one field was resolved
    Matched(PropertyRecord),
    /// The site reported no records, or the detail page carried no known fields
    NotFound,
    /// The lookup broke before reaching a detail page
    Failed(String),
}

impl LookupOutcome {
    pub fn into_record(self) -> PropertyRecord {
        match self {
            Self::Matched(record) => record,
            Self::NotFound | Self::Failed(_) => PropertyRecord::not_found(),
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Matched(_) => "matched",
            Self::NotFound => "not found",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for LookupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {}", reason),
            other => f.write_str(other.label()),
        }
    }
}

#[derive(Debug)]
enum LookupPhase {
    Searching,
    NoResults,
    ResultList,
    Detail,
    Extracted(PropertyRecord),
}

/// Resolves names against the property site through one page session
pub struct PropertyResolver {
    accessor: Box<dyn PageAccessor>,
    settings: LookupSettings,
    retry: RetryPolicy,
    limiter: RateLimiter,
}

impl PropertyResolver {
    pub fn new(accessor: Box<dyn PageAccessor>, settings: LookupSettings, retry: RetryPolicy) -> Self {
        let limiter = RateLimiter::new(settings.pacing);
        Self {
            accessor,
            settings,
            retry,
            limiter,
        }
    }

    /// Returns the property record for a name, never failing
    ///
    /// Any failure along the way yields the all-sentinel record.
    pub async fn resolve(&self, first_name: &str, last_name: &str) -> PropertyRecord {
        self.lookup(&NamePair::new(first_name, last_name))
            .await
            .into_record()
    }

    /// Runs one lookup, paced against the previous one on this session
    pub async fn lookup(&self, pair: &NamePair) -> LookupOutcome {
        let clock = self.retry.clock().clone();
        self.limiter.pace(clock.as_ref()).await;

        let outcome = match self.drive(pair).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Lookup for {} failed: {}", pair, e);
                LookupOutcome::Failed(e.to_string())
            }
        };

        self.limiter.record_completion(clock.now());
        tracing::debug!("Lookup for {}: {}", pair, outcome);
        outcome
    }

    async fn drive(&self, pair: &NamePair) -> Result<LookupOutcome, HarvestError> {
        let mut phase = LookupPhase::Searching;

        loop {
            phase = match phase {
                LookupPhase::Searching => self.search(pair).await?,
                LookupPhase::NoResults => return Ok(LookupOutcome::NotFound),
                LookupPhase::ResultList => match self.open_first_result().await {
                    Ok(()) => LookupPhase::Detail,
                    Err(e) => {
                        tracing::debug!("No selectable result for {}: {}", pair, e);
                        return Ok(LookupOutcome::Failed(e.to_string()));
                    }
                },
                LookupPhase::Detail => {
                    let html = self.accessor.snapshot().await?;
                    LookupPhase::Extracted(self.settings.layout.read(&html))
                }
                LookupPhase::Extracted(record) => {
                    return Ok(if record.is_not_found() {
                        LookupOutcome::NotFound
                    } else {
                        LookupOutcome::Matched(record)
                    });
                }
            };
        }
    }

    /// Submits the owner search and decides where it landed
    async fn search(&self, pair: &NamePair) -> Result<LookupPhase, HarvestError> {
        let settings = &self.settings;

        self.retry
            .run("open search form", || async {
                self.accessor.navigate(&settings.search_url).await?;
                self.accessor
                    .wait_for_selector(&settings.query_input, settings.element_timeout)
                    .await?;
                Ok::<(), HarvestError>(())
            })
            .await?;

        let query = pair.search_query();
        tracing::trace!("Searching for '{}'", query);
        self.accessor.fill(&settings.query_input, &query).await?;
        self.accessor.submit(&settings.query_input).await?;
        self.retry.clock().sleep(settings.settle_delay).await;

        let html = self.accessor.snapshot().await?;
        if document_mentions(&html, &settings.no_results_text) {
            return Ok(LookupPhase::NoResults);
        }

        let url = self.accessor.current_url().await?;
        if settings.is_result_list(&url) {
            Ok(LookupPhase::ResultList)
        } else {
            Ok(LookupPhase::Detail)
        }
    }

    async fn open_first_result(&self) -> Result<(), HarvestError> {
        let settings = &self.settings;
        self.accessor
            .wait_for_selector(&settings.result_row, settings.element_timeout)
            .await?;
        self.accessor.click(&settings.result_row).await?;
        self.retry.clock().sleep(settings.settle_delay).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{select_snapshots, ElementSnapshot};
    use crate::model::NOT_ON_AUDITOR;
    use crate::retry::ManualClock;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const SEARCH_URL: &str = "https://auditor.example.com/search/commonsearch.aspx?mode=owner";
    const LIST_URL: &str = "https://auditor.example.com/search/CommonSearch.aspx?mode=OWNER";
    const DETAIL_URL: &str = "https://auditor.example.com/datalets/datalet.aspx?parid=7";

    const SEARCH_PAGE: &str = r#"<form><input id="inpOwner" name="inpOwner"></form>"#;
    const NO_RESULTS_PAGE: &str =
        r#"<form><input id="inpOwner"></form><large>Your search did not find any records</large>"#;
    const LIST_PAGE: &str = r#"<table><tr class="SearchResults"><td>SMITH JOHN</td></tr></table>"#;
    const EMPTY_LIST_PAGE: &str = r#"<table><tr><td>Results</td></tr></table>"#;
    const DETAIL_PAGE: &str = r#"
        <table>
          <tr><td class="DataletSideHeading">Owner Mailing</td><td class="DataletData">PO BOX 9</td></tr>
          <tr><td class="DataletSideHeading">Contact Address</td><td class="DataletData">123 MAIN ST</td></tr>
          <tr><td class="DataletSideHeading">Site (Property) Address</td><td class="DataletData">55 ELM AVE</td></tr>
          <tr><td class="DataletSideHeading">City/Village</td><td class="DataletData">COLUMBUS</td></tr>
          <tr><td class="DataletSideHeading">Zip Code</td><td class="DataletData">43215</td></tr>
        </table>
    "#;

    /// Property site answering each query with a scripted page
    struct FakeAuditor {
        answers: HashMap<String, (&'static str, &'static str)>,
        current: Mutex<(String, String)>,
        query: Mutex<String>,
        searches: AtomicUsize,
    }

    impl FakeAuditor {
        fn new(answers: Vec<(&str, &'static str, &'static str)>) -> Self {
            Self {
                answers: answers
                    .into_iter()
                    .map(|(q, url, page)| (q.to_string(), (url, page)))
                    .collect(),
                current: Mutex::new((String::new(), String::new())),
                query: Mutex::new(String::new()),
                searches: AtomicUsize::new(0),
            }
        }

        fn show(&self, url: &str, page: &str) {
            *self.current.lock().unwrap() = (url.to_string(), page.to_string());
        }

        fn page(&self) -> String {
            self.current.lock().unwrap().1.clone()
        }
    }

    #[async_trait]
    impl PageAccessor for FakeAuditor {
        async fn navigate(&self, url: &str) -> Result<(), HarvestError> {
            self.show(url, SEARCH_PAGE);
            Ok(())
        }

        async fn snapshot(&self) -> Result<String, HarvestError> {
            Ok(self.page())
        }

        async fn scroll_by(&self, _amount: u32) -> Result<(), HarvestError> {
            Ok(())
        }

        async fn document_height(&self) -> Result<u64, HarvestError> {
            Ok(1080)
        }

        async fn wait_for_selector(
            &self,
            selector: &str,
            _timeout: Duration,
        ) -> Result<ElementSnapshot, HarvestError> {
            select_snapshots(&self.page(), selector)?
                .into_iter()
                .next()
                .ok_or_else(|| HarvestError::ElementTimeout {
                    selector: selector.to_string(),
                })
        }

        async fn find_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, HarvestError> {
            select_snapshots(&self.page(), selector)
        }

        async fn current_url(&self) -> Result<String, HarvestError> {
            Ok(self.current.lock().unwrap().0.clone())
        }

        async fn fill(&self, _selector: &str, text: &str) -> Result<(), HarvestError> {
            *self.query.lock().unwrap() = text.to_string();
            Ok(())
        }

        async fn submit(&self, _selector: &str) -> Result<(), HarvestError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            let query = self.query.lock().unwrap().clone();
            let (url, page) = self
                .answers
                .get(&query)
                .copied()
                .unwrap_or((SEARCH_URL, NO_RESULTS_PAGE));
            self.show(url, page);
            Ok(())
        }

        async fn click(&self, _selector: &str) -> Result<(), HarvestError> {
            self.show(DETAIL_URL, DETAIL_PAGE);
            Ok(())
        }
    }

    /// Accessor whose every call fails
    struct BrokenSession;

    #[async_trait]
    impl PageAccessor for BrokenSession {
        async fn navigate(&self, url: &str) -> Result<(), HarvestError> {
            Err(HarvestError::TransientFetch {
                url: url.to_string(),
                message: "Connection refused".to_string(),
            })
        }

        async fn snapshot(&self) -> Result<String, HarvestError> {
            Err(HarvestError::NoPageLoaded)
        }

        async fn scroll_by(&self, _amount: u32) -> Result<(), HarvestError> {
            Err(HarvestError::NoPageLoaded)
        }

        async fn document_height(&self) -> Result<u64, HarvestError> {
            Err(HarvestError::NoPageLoaded)
        }

        async fn wait_for_selector(
            &self,
            selector: &str,
            _timeout: Duration,
        ) -> Result<ElementSnapshot, HarvestError> {
            Err(HarvestError::ElementTimeout {
                selector: selector.to_string(),
            })
        }

        async fn find_all(&self, _selector: &str) -> Result<Vec<ElementSnapshot>, HarvestError> {
            Err(HarvestError::NoPageLoaded)
        }

        async fn current_url(&self) -> Result<String, HarvestError> {
            Err(HarvestError::NoPageLoaded)
        }

        async fn fill(&self, _selector: &str, _text: &str) -> Result<(), HarvestError> {
            Err(HarvestError::NoPageLoaded)
        }

        async fn submit(&self, _selector: &str) -> Result<(), HarvestError> {
            Err(HarvestError::NoPageLoaded)
        }

        async fn click(&self, _selector: &str) -> Result<(), HarvestError> {
            Err(HarvestError::NoPageLoaded)
        }
    }

    fn lookup_config() -> LookupConfig {
        toml::from_str(&format!("search-url = \"{}\"", SEARCH_URL)).unwrap()
    }

    fn resolver(accessor: Box<dyn PageAccessor>, clock: Arc<ManualClock>) -> PropertyResolver {
        let settings = LookupSettings::from_config(&lookup_config()).unwrap();
        let retry = RetryPolicy::new(2, DelayRange::fixed(Duration::from_millis(100)), clock);
        PropertyResolver::new(accessor, settings, retry)
    }

    #[tokio::test]
    async fn test_result_list_to_detail() {
        let site = FakeAuditor::new(vec![("Smith John", LIST_URL, LIST_PAGE)]);
        let clock = Arc::new(ManualClock::new());
        let resolver = resolver(Box::new(site), clock);

        let outcome = resolver.lookup(&NamePair::new("John", "Smith")).await;

        let LookupOutcome::Matched(record) = outcome else {
            panic!("expected a match");
        };
        assert_eq!(record.owner_mailing, "PO BOX 9");
        assert_eq!(record.contact_address, "123 MAIN ST");
        assert_eq!(record.site_address, "55 ELM AVE");
        assert_eq!(record.city, "COLUMBUS");
        assert_eq!(record.zip_code, "43215");
    }

    #[tokio::test]
    async fn test_single_match_lands_on_detail() {
        let site = FakeAuditor::new(vec![("Doe Jane", DETAIL_URL, DETAIL_PAGE)]);
        let clock = Arc::new(ManualClock::new());
        let resolver = resolver(Box::new(site), clock);

        let record = resolver.resolve("Jane", "Doe").await;

        assert_eq!(record.zip_code, "43215");
        assert!(record.has_owner_mailing());
    }

    #[tokio::test]
    async fn test_no_results_is_not_found() {
        let site = FakeAuditor::new(vec![]);
        let clock = Arc::new(ManualClock::new());
        let resolver = resolver(Box::new(site), clock);

        let outcome = resolver.lookup(&NamePair::new("Nobody", "Here")).await;

        assert_eq!(outcome, LookupOutcome::NotFound);
        assert!(outcome.into_record().is_not_found());
    }

    #[tokio::test]
    async fn test_result_list_without_rows_fails() {
        let site = FakeAuditor::new(vec![("Smith John", LIST_URL, EMPTY_LIST_PAGE)]);
        let clock = Arc::new(ManualClock::new());
        let resolver = resolver(Box::new(site), clock);

        let outcome = resolver.lookup(&NamePair::new("John", "Smith")).await;

        assert!(matches!(outcome, LookupOutcome::Failed(_)));
        assert!(outcome.into_record().is_not_found());
    }

    #[tokio::test]
    async fn test_resolve_is_total() {
        let clock = Arc::new(ManualClock::new());
        let resolver = resolver(Box::new(BrokenSession), clock.clone());

        let record = resolver.resolve("John", "Smith").await;

        assert_eq!(record.fields(), [NOT_ON_AUDITOR; 5]);
        // the search form load was retried twice before giving up
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(100); 2]);
    }

    #[tokio::test]
    async fn test_lookups_are_paced() {
        let site = FakeAuditor::new(vec![]);
        let clock = Arc::new(ManualClock::new());
        let resolver = resolver(Box::new(site), clock.clone());

        resolver.resolve("A", "One").await;
        let after_first = clock.total_slept();
        resolver.resolve("B", "Two").await;
        let second = clock.total_slept() - after_first;

        // pacing of 2-4s before the second lookup, then the 2s settle delay
        assert!(second >= Duration::from_millis(4000));
        assert!(second <= Duration::from_millis(6000));
        assert_eq!(clock.sleeps().len(), 3);
    }

    #[test]
    fn test_result_list_marker_ignores_case() {
        let settings = LookupSettings::from_config(&lookup_config()).unwrap();
        assert!(settings.is_result_list(LIST_URL));
        assert!(settings.is_result_list(&LIST_URL.to_lowercase()));
        assert!(!settings.is_result_list(DETAIL_URL));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(LookupOutcome::NotFound.label(), "not found");
        assert_eq!(
            LookupOutcome::Failed("timeout".to_string()).to_string(),
            "failed: timeout"
        );
        assert!(LookupOutcome::Matched(PropertyRecord::not_found()).is_matched());
    }
}
