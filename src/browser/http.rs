//! Static-HTML page accessor
//!
//! This accessor fetches documents with reqwest and queries them with scraper.
//! It does not run scripts, so:
//! - A document is fully rendered as soon as it loads and reports a height of
//!   one viewport; scrolling moves a virtual position only
//! - `wait_for_selector` checks once instead of polling, since nothing can
//!   appear later
//! - `click` follows the element's link and `submit` sends its form

use crate::browser::document::{form_request, input_name, link_target, FormMethod};
use crate::browser::{select_snapshots, AccessorFactory, ElementSnapshot, PageAccessor};
use crate::config::UserAgentConfig;
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, Response};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use url::Url;

/// Height reported for a loaded document, in pixels
pub const DEFAULT_VIEWPORT_HEIGHT: u64 = 1080;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use obit_harvest::config::UserAgentConfig;
/// use obit_harvest::browser::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "ObitHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// The document a session currently shows
#[derive(Debug)]
struct LoadedPage {
    url: Url,
    body: String,
    scroll_position: u64,
    filled: HashMap<String, String>,
}

/// A browsing session over plain HTTP
pub struct HttpPageAccessor {
    client: Client,
    viewport_height: u64,
    page: Mutex<Option<LoadedPage>>,
}

impl HttpPageAccessor {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            page: Mutex::new(None),
        }
    }

    pub fn with_viewport_height(mut self, height: u64) -> Self {
        self.viewport_height = height;
        self
    }

    /// Returns the virtual scroll position of the current document
    pub fn scroll_position(&self) -> Result<u64, HarvestError> {
        self.with_page(|page| Ok(page.scroll_position))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<LoadedPage>>, HarvestError> {
        self.page
            .lock()
            .map_err(|_| HarvestError::Worker("page session lock poisoned".to_string()))
    }

    /// Runs `f` against the loaded page without holding the lock across an await
    fn with_page<T>(
        &self,
        f: impl FnOnce(&mut LoadedPage) -> Result<T, HarvestError>,
    ) -> Result<T, HarvestError> {
        let mut guard = self.lock()?;
        let page = guard.as_mut().ok_or(HarvestError::NoPageLoaded)?;
        f(page)
    }

    /// Reads a response into the session, replacing the current document
    async fn load(&self, requested: &str, response: Response) -> Result<(), HarvestError> {
        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(HarvestError::TransientFetch {
                url: requested.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(HarvestError::TransientFetch {
                url: requested.to_string(),
                message: format!("Expected HTML, got {}", content_type),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| fetch_failure(requested, e))?;

        tracing::trace!("Loaded {} ({} bytes)", final_url, body.len());

        *self.lock()? = Some(LoadedPage {
            url: final_url,
            body,
            scroll_position: 0,
            filled: HashMap::new(),
        });

        Ok(())
    }
}

/// Classifies a reqwest failure the way the fetcher reports it
fn fetch_failure(url: &str, e: reqwest::Error) -> HarvestError {
    let message = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        return HarvestError::Http {
            url: url.to_string(),
            source: e,
        };
    };

    HarvestError::TransientFetch {
        url: url.to_string(),
        message,
    }
}

#[async_trait]
impl PageAccessor for HttpPageAccessor {
    async fn navigate(&self, url: &str) -> Result<(), HarvestError> {
        tracing::debug!("Navigating to {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_failure(url, e))?;
        self.load(url, response).await
    }

    async fn snapshot(&self) -> Result<String, HarvestError> {
        self.with_page(|page| Ok(page.body.clone()))
    }

    async fn scroll_by(&self, amount: u32) -> Result<(), HarvestError> {
        self.with_page(|page| {
            page.scroll_position += u64::from(amount);
            Ok(())
        })
    }

    async fn document_height(&self) -> Result<u64, HarvestError> {
        self.with_page(|_| Ok(self.viewport_height))
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<ElementSnapshot, HarvestError> {
        let body = self.snapshot().await?;
        select_snapshots(&body, selector)?
            .into_iter()
            .next()
            .ok_or_else(|| HarvestError::ElementTimeout {
                selector: selector.to_string(),
            })
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, HarvestError> {
        let body = self.snapshot().await?;
        select_snapshots(&body, selector)
    }

    async fn current_url(&self) -> Result<String, HarvestError> {
        self.with_page(|page| Ok(page.url.to_string()))
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), HarvestError> {
        self.with_page(|page| {
            let name = input_name(&page.body, selector)?;
            page.filled.insert(name, text.to_string());
            Ok(())
        })
    }

    async fn submit(&self, selector: &str) -> Result<(), HarvestError> {
        let request =
            self.with_page(|page| form_request(&page.body, selector, &page.url, &page.filled))?;

        tracing::debug!("Submitting form to {}", request.action);
        let target = request.action.to_string();
        let builder = match request.method {
            FormMethod::Get => {
                let mut url = request.action;
                url.query_pairs_mut().extend_pairs(&request.fields);
                self.client.get(url)
            }
            FormMethod::Post => self.client.post(request.action).form(&request.fields),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| fetch_failure(&target, e))?;
        self.load(&target, response).await
    }

    async fn click(&self, selector: &str) -> Result<(), HarvestError> {
        let target = self.with_page(|page| link_target(&page.body, selector, &page.url))?;
        self.navigate(target.as_str()).await
    }
}

/// Opens one `HttpPageAccessor` per caller over a shared connection pool
#[derive(Clone)]
pub struct HttpAccessorFactory {
    client: Client,
    viewport_height: u64,
}

impl HttpAccessorFactory {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }

    pub fn from_config(config: &UserAgentConfig) -> Result<Self, HarvestError> {
        Ok(Self::new(build_http_client(config)?))
    }
}

impl AccessorFactory for HttpAccessorFactory {
    fn open(&self) -> Result<Box<dyn PageAccessor>, HarvestError> {
        Ok(Box::new(
            HttpPageAccessor::new(self.client.clone()).with_viewport_height(self.viewport_height),
        ))
    }
}
