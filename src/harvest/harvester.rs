//! Scroll-driven harvest of one listing
//!
//! The harvester moves through `Loading -> Extracting -> Scrolling ->
//! (Extracting | Done)`. It stops when the scroll position reaches the
//! document height after an extraction pass, or when enough consecutive
//! passes add nothing new. Both checks are needed: some listings grow their
//! height lazily, and some mount content only after a delay.

use crate::browser::PageAccessor;
use crate::config::HarvestConfig;
use crate::harvest::extract::{extract_entries, ListingEntry, SourceProfile};
use crate::model::{ObituaryRecord, ScrollKey, Source};
use crate::names::normalize_name;
use crate::retry::RetryPolicy;
use crate::HarvestError;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Tunables for one harvest
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    pub scroll_step: u32,
    pub scroll_jitter: u32,
    pub settle_delay: Duration,
    pub stagnant_threshold: u32,
    pub max_scroll_rounds: u32,
    pub load_timeout: Duration,
}

impl From<&HarvestConfig> for HarvestSettings {
    fn from(config: &HarvestConfig) -> Self {
        Self {
            scroll_step: config.scroll_step,
            scroll_jitter: config.scroll_jitter,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            stagnant_threshold: config.stagnant_threshold,
            max_scroll_rounds: config.max_scroll_rounds,
            load_timeout: Duration::from_millis(config.load_timeout_ms),
        }
    }
}

impl HarvestSettings {
    fn next_step(&self) -> u32 {
        if self.scroll_jitter == 0 {
            self.scroll_step
        } else {
            self.scroll_step + rand::thread_rng().gen_range(0..=self.scroll_jitter)
        }
    }
}

/// Why a harvest stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Scroll position reached the document height
    ReachedBottom,
    /// Too many consecutive passes added no records
    Stagnant,
    /// The scroll round cap was hit
    RoundLimit,
    /// The listing never loaded
    LoadFailed,
    /// The page failed after loading; records so far are kept
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ReachedBottom => "reached bottom",
            Self::Stagnant => "no new records",
            Self::RoundLimit => "round limit",
            Self::LoadFailed => "load failed",
            Self::Interrupted => "interrupted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HarvestPhase {
    Loading,
    Extracting,
    Scrolling,
    Done(StopReason),
}

/// Transient state of one source's harvest
#[derive(Debug, Default)]
pub struct HarvestState {
    pub scroll_position: u64,
    pub seen_keys: HashSet<ScrollKey>,
    pub stagnant_rounds: u32,
    pub document_height: u64,
    pub rounds: u32,
}

/// Everything one harvest produced
#[derive(Debug)]
pub struct HarvestReport {
    pub source: Source,
    /// Records in discovery order
    pub records: Vec<ObituaryRecord>,
    /// Scroll rounds performed
    pub rounds: u32,
    pub stop_reason: StopReason,
    /// The failure that ended the harvest early, if any
    pub error: Option<HarvestError>,
}

impl HarvestReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Drives one page session through a listing
pub struct ScrollHarvester<'a> {
    accessor: &'a dyn PageAccessor,
    retry: RetryPolicy,
    settings: HarvestSettings,
}

impl<'a> ScrollHarvester<'a> {
    pub fn new(accessor: &'a dyn PageAccessor, retry: RetryPolicy, settings: HarvestSettings) -> Self {
        Self {
            accessor,
            retry,
            settings,
        }
    }

    /// Harvests every dated name from the listing described by `profile`
    ///
    /// Never fails: a listing that cannot be loaded yields an empty report
    /// carrying `HarvestError::SourceHarvest`, and a failure after loading
    /// keeps the records already collected.
    pub async fn harvest(&self, profile: &SourceProfile) -> HarvestReport {
        let mut state = HarvestState::default();
        let mut records = Vec::new();
        let mut error = None;
        let mut phase = HarvestPhase::Loading;

        tracing::info!("Harvesting {} from {}", profile.kind, profile.url);

        let stop_reason = loop {
            phase = match phase {
                HarvestPhase::Loading => match self.load(profile).await {
                    Ok(height) => {
                        state.document_height = height;
                        HarvestPhase::Extracting
                    }
                    Err(e) => {
                        tracing::warn!("Could not load {}: {}", profile.kind, e);
                        error = Some(HarvestError::SourceHarvest {
                            listing: profile.kind.to_string(),
                            message: e.to_string(),
                        });
                        HarvestPhase::Done(StopReason::LoadFailed)
                    }
                },
                HarvestPhase::Extracting => {
                    match self.extract(profile, &mut state, &mut records).await {
                        Ok(next) => next,
                        Err(e) => {
                            tracing::warn!("Extraction on {} failed: {}", profile.kind, e);
                            error = Some(e);
                            HarvestPhase::Done(StopReason::Interrupted)
                        }
                    }
                }
                HarvestPhase::Scrolling => match self.scroll(&mut state).await {
                    Ok(()) => HarvestPhase::Extracting,
                    Err(e) => {
                        tracing::warn!("Scrolling {} failed: {}", profile.kind, e);
                        error = Some(e);
                        HarvestPhase::Done(StopReason::Interrupted)
                    }
                },
                HarvestPhase::Done(reason) => break reason,
            };
        };

        tracing::info!(
            "Harvested {} records from {} in {} rounds ({})",
            records.len(),
            profile.kind,
            state.rounds,
            stop_reason
        );

        HarvestReport {
            source: profile.kind,
            records,
            rounds: state.rounds,
            stop_reason,
            error,
        }
    }

    /// Loads the listing, dismisses popups and reads the initial height
    async fn load(&self, profile: &SourceProfile) -> Result<u64, HarvestError> {
        let operation = format!("load {}", profile.kind);
        self.retry
            .run(&operation, || async {
                self.accessor.navigate(&profile.url).await?;
                self.accessor
                    .wait_for_selector(&profile.root_selector, self.settings.load_timeout)
                    .await?;
                Ok::<(), HarvestError>(())
            })
            .await?;

        // At most one popup is closed; a click may also navigate
        for selector in &profile.dismiss_selectors {
            match self.accessor.click(selector).await {
                Ok(()) => {
                    tracing::debug!("Dismissed '{}' on {}", selector, profile.kind);
                    break;
                }
                Err(e) => tracing::debug!("No popup '{}' on {}: {}", selector, profile.kind, e),
            }
        }

        self.accessor.document_height().await
    }

    /// Runs one extraction pass and decides whether to keep scrolling
    async fn extract(
        &self,
        profile: &SourceProfile,
        state: &mut HarvestState,
        records: &mut Vec<ObituaryRecord>,
    ) -> Result<HarvestPhase, HarvestError> {
        let html = self.accessor.snapshot().await?;

        let mut added = 0usize;
        for entry in extract_entries(&html, profile) {
            let record = to_record(entry, profile.kind);
            if state.seen_keys.insert(record.scroll_key()) {
                tracing::trace!("New record: {} ({})", record.full_name, record.date);
                records.push(record);
                added += 1;
            }
        }

        if added == 0 {
            state.stagnant_rounds += 1;
        } else {
            state.stagnant_rounds = 0;
        }

        tracing::debug!(
            "{} pass {}: {} new, {} total, position {}/{}",
            profile.kind,
            state.rounds,
            added,
            records.len(),
            state.scroll_position,
            state.document_height
        );

        let next = if state.stagnant_rounds >= self.settings.stagnant_threshold {
            HarvestPhase::Done(StopReason::Stagnant)
        } else if state.scroll_position >= state.document_height {
            HarvestPhase::Done(StopReason::ReachedBottom)
        } else if state.rounds >= self.settings.max_scroll_rounds {
            HarvestPhase::Done(StopReason::RoundLimit)
        } else {
            HarvestPhase::Scrolling
        };

        Ok(next)
    }

    async fn scroll(&self, state: &mut HarvestState) -> Result<(), HarvestError> {
        let step = self.settings.next_step();
        self.accessor.scroll_by(step).await?;
        state.scroll_position += u64::from(step);
        state.rounds += 1;

        self.retry.clock().sleep(self.settings.settle_delay).await;
        state.document_height = self.accessor.document_height().await?;
        Ok(())
    }
}

fn to_record(entry: ListingEntry, source: Source) -> ObituaryRecord {
    let (first_name, last_name, full_name) = normalize_name(&entry.raw_name).into_parts();
    ObituaryRecord {
        first_name,
        last_name,
        full_name,
        date: entry.date,
        source,
        age: entry.age,
        location: entry.location,
    }
}
