//! Pipeline orchestration
//!
//! Harvest every source on one page session, deduplicate, resolve each
//! distinct name pair exactly once on a small pool of workers, then join.
//! Each worker opens its own session; sessions are never shared between
//! concurrent lookups.

use crate::browser::AccessorFactory;
use crate::config::Config;
use crate::harvest::{HarvestReport, HarvestSettings, ScrollHarvester, SourceProfile};
use crate::lookup::{LookupOutcome, LookupSettings, PropertyResolver};
use crate::model::{CorrelatedRecord, NamePair, PropertyRecord};
use crate::pipeline::correlate::{correlate, dedup_by_name_source, distinct_name_pairs};
use crate::pipeline::summary::{RunSummary, SourceSummary};
use crate::retry::{Clock, RetryPolicy};
use crate::HarvestError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// The table and statistics a run produced
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub records: Vec<CorrelatedRecord>,
    pub summary: RunSummary,
}

impl PipelineRun {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Runs harvest, lookup and correlation for a configuration
pub struct CorrelationPipeline {
    config: Arc<Config>,
    factory: Arc<dyn AccessorFactory>,
    clock: Arc<dyn Clock>,
}

impl CorrelationPipeline {
    pub fn new(config: Config, factory: Arc<dyn AccessorFactory>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: Arc::new(config),
            factory,
            clock,
        }
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(&self.config.retry, self.clock.clone())
    }

    /// Runs the whole pipeline
    ///
    /// A run that harvests nothing stops before any lookup and returns an
    /// empty table.
    ///
    /// # Returns
    ///
    /// * `Ok(PipelineRun)` - The correlated table and run statistics
    /// * `Err(HarvestError)` - A session could not be opened or a selector
    ///   failed to compile
    pub async fn run(&self) -> Result<PipelineRun, HarvestError> {
        let mut summary = RunSummary::default();

        let reports = self.harvest().await?;
        summary.sources = reports.iter().map(SourceSummary::from).collect();

        let harvested: Vec<_> = reports.into_iter().flat_map(|r| r.records).collect();
        let total = harvested.len();
        let records = dedup_by_name_source(harvested);
        summary.duplicates_dropped = total - records.len();

        if records.is_empty() {
            tracing::warn!("No obituaries harvested from any source; skipping property lookups");
            return Ok(PipelineRun {
                records: Vec::new(),
                summary,
            });
        }

        let pairs = distinct_name_pairs(&records);
        summary.distinct_pairs = pairs.len();
        tracing::info!(
            "{} unique obituaries, {} distinct names to look up",
            records.len(),
            pairs.len()
        );

        let outcomes = self.resolve(pairs).await?;
        let mut properties: HashMap<NamePair, PropertyRecord> = HashMap::new();
        for (pair, outcome) in outcomes {
            summary.count_outcome(&outcome);
            properties.insert(pair, outcome.into_record());
        }

        let table = correlate(records, &properties);
        summary.count_table(&table);

        Ok(PipelineRun {
            records: table,
            summary,
        })
    }

    /// Harvests every configured source in turn on one page session
    ///
    /// A source that fails to load contributes an empty report.
    pub async fn harvest(&self) -> Result<Vec<HarvestReport>, HarvestError> {
        let accessor = self.factory.open()?;
        let settings = HarvestSettings::from(&self.config.harvest);
        let harvester = ScrollHarvester::new(accessor.as_ref(), self.retry_policy(), settings);

        let mut reports = Vec::with_capacity(self.config.sources.len());
        for source in &self.config.sources {
            let profile = SourceProfile::from_config(source)?;
            reports.push(harvester.harvest(&profile).await);
        }

        Ok(reports)
    }

    /// Looks up every pair once, spread round-robin over the worker pool
    ///
    /// Each worker owns its slice of pairs, so no two workers produce the
    /// same key. A worker that cannot start or panics marks its pairs failed.
    pub async fn resolve(
        &self,
        pairs: Vec<NamePair>,
    ) -> Result<Vec<(NamePair, LookupOutcome)>, HarvestError> {
        let settings = LookupSettings::from_config(&self.config.lookup)?;
        let total = pairs.len();
        let workers = (self.config.lookup.workers as usize).clamp(1, total.max(1));

        let mut chunks: Vec<Vec<NamePair>> = vec![Vec::new(); workers];
        for (i, pair) in pairs.into_iter().enumerate() {
            chunks[i % workers].push(pair);
        }

        tracing::info!("Resolving {} names on {} workers", total, workers);
        let done = Arc::new(AtomicUsize::new(0));
        let mut results = Vec::with_capacity(total);
        let mut handles = Vec::with_capacity(workers);

        for (worker, chunk) in chunks.into_iter().enumerate() {
            let accessor = match self.factory.open() {
                Ok(accessor) => accessor,
                Err(e) => {
                    tracing::error!("Worker {} could not open a session: {}", worker, e);
                    results.extend(failed(chunk, &e.to_string()));
                    continue;
                }
            };

            let resolver = PropertyResolver::new(accessor, settings.clone(), self.retry_policy());
            let done = done.clone();
            let pairs = chunk.clone();

            let handle = tokio::spawn(async move {
                let mut outcomes = Vec::with_capacity(pairs.len());
                for pair in pairs {
                    let outcome = resolver.lookup(&pair).await;
                    let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                    tracing::info!("[{}/{}] {}: {}", finished, total, pair, outcome.label());
                    outcomes.push((pair, outcome));
                }
                outcomes
            });
            handles.push((worker, chunk, handle));
        }

        for (worker, chunk, handle) in handles {
            match handle.await {
                Ok(outcomes) => results.extend(outcomes),
                Err(e) => {
                    tracing::error!("Worker {} stopped: {}", worker, e);
                    results.extend(failed(chunk, &e.to_string()));
                }
            }
        }

        Ok(results)
    }
}

fn failed(pairs: Vec<NamePair>, reason: &str) -> Vec<(NamePair, LookupOutcome)> {
    pairs
        .into_iter()
        .map(|pair| (pair, LookupOutcome::Failed(reason.to_string())))
        .collect()
}
