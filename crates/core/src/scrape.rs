//! Multi-period scrape orchestration.
//!
//! A [`Scraper`] drives one renderer session across every configured time
//! period, strictly in order: switch the page to the period, wait for the
//! list to render, capture a snapshot, run the extraction chain, and record
//! a partition. A period that fails yields an empty partition carrying the
//! error; only failing to load the page at all empties the whole report.

use serde::Serialize;

use crate::config::ScrapeConfig;
use crate::domains::DomainMap;
use crate::entity::{Category, RankedEntity};
use crate::merge::{Strategy, extract_period};
use crate::renderer::{Renderer, ScrollPosition, wait_for_markup};
use crate::snapshot::PageSnapshot;
use crate::{RankwatchError, Result};

/// Entities scraped for one time period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodResult {
    pub time_period: String,
    pub entities: Vec<RankedEntity>,
    /// Strategy that produced `entities`; `None` when nothing was extracted.
    pub strategy: Option<Strategy>,
    /// Why the period produced nothing, if it failed.
    pub error: Option<String>,
}

impl PeriodResult {
    fn failed(time_period: &str, error: impl ToString) -> Self {
        Self {
            time_period: time_period.to_string(),
            entities: Vec::new(),
            strategy: None,
            error: Some(error.to_string()),
        }
    }
}

/// Per-period partitions of one scrape, in the order periods were visited.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeReport {
    pub category: Category,
    pub partitions: Vec<PeriodResult>,
    /// Set when no usable page could be loaded.
    pub error: Option<String>,
}

impl ScrapeReport {
    pub fn new(category: Category) -> Self {
        Self { category, partitions: Vec::new(), error: None }
    }

    fn failed(category: Category, error: impl ToString) -> Self {
        Self { category, partitions: Vec::new(), error: Some(error.to_string()) }
    }

    /// Number of entities across every partition.
    pub fn total(&self) -> usize {
        self.partitions.iter().map(|p| p.entities.len()).sum()
    }

    /// Every entity, partition by partition.
    pub fn all_entities(&self) -> impl Iterator<Item = &RankedEntity> {
        self.partitions.iter().flat_map(|p| p.entities.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn partition(&self, time_period: &str) -> Option<&PeriodResult> {
        self.partitions.iter().find(|p| p.time_period == time_period)
    }

    /// True when the page loaded; individual periods may still have failed.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Orchestrates a multi-period scrape over one renderer session.
pub struct Scraper<'a, R: Renderer + ?Sized> {
    renderer: &'a mut R,
    config: &'a ScrapeConfig,
    domains: &'a DomainMap,
}

impl<'a, R: Renderer + ?Sized> Scraper<'a, R> {
    pub fn new(renderer: &'a mut R, config: &'a ScrapeConfig, domains: &'a DomainMap) -> Self {
        Self { renderer, config, domains }
    }

    /// Scrapes every configured period from the rankings page.
    pub fn run(&mut self) -> ScrapeReport {
        let url = self.config.rankings_url();
        tracing::info!(url = %url, category = %self.config.category, "starting scrape");

        if let Err(e) = self.renderer.navigate(&url) {
            tracing::error!(error = %e, "could not load rankings page");
            return ScrapeReport::failed(self.config.category, e);
        }

        self.settle();
        self.nudge_lazy_content();

        if let Some(label) = &self.config.section_label
            && !self.renderer.click_matching(label)
        {
            tracing::warn!(label = %label, "could not open section, using current view");
        }

        let config = self.config;
        let mut report = ScrapeReport::new(config.category);
        for period in &config.periods {
            let result = match self.scrape_period(period) {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(period = %period, error = %e, "period failed");
                    PeriodResult::failed(period, e)
                }
            };
            report.partitions.push(result);
        }

        tracing::info!(total = report.total(), periods = report.partitions.len(), "scrape finished");
        report
    }

    fn scrape_period(&mut self, period: &str) -> Result<PeriodResult> {
        if !self.renderer.click_matching(period) {
            tracing::warn!(period, "could not select period, scraping current view");
        }

        if let Some(label) = &self.config.expand_label
            && !self.renderer.click_matching(label)
        {
            tracing::warn!(label = %label, "could not expand list");
        }

        self.settle();
        self.nudge_lazy_content();
        wait_for_markup(
            &mut *self.renderer,
            &self.config.ready_markers,
            self.config.ready_timeout,
            self.config.poll_interval,
        );

        let snapshot = self.renderer.snapshot()?;
        self.extract(&snapshot, period)
    }

    fn extract(&self, snapshot: &PageSnapshot, period: &str) -> Result<PeriodResult> {
        if snapshot.is_blank() {
            return Err(RankwatchError::NoSnapshot(format!("blank page for '{}'", period)));
        }

        let extraction = extract_period(snapshot, self.config, self.domains, period);
        Ok(PeriodResult {
            time_period: period.to_string(),
            entities: extraction.entities,
            strategy: extraction.strategy,
            error: None,
        })
    }

    fn settle(&mut self) {
        self.renderer.pause(self.config.settle);
    }

    /// Scrolls to the bottom and back so lazily rendered rows load.
    fn nudge_lazy_content(&mut self) {
        for position in [ScrollPosition::Bottom, ScrollPosition::Top] {
            if let Err(e) = self.renderer.scroll_to(position) {
                tracing::debug!(error = %e, "scroll failed");
            }
        }
    }
}

/// Scrapes with a fresh [`Scraper`].
pub fn scrape<R: Renderer + ?Sized>(renderer: &mut R, config: &ScrapeConfig, domains: &DomainMap) -> ScrapeReport {
    Scraper::new(renderer, config, domains).run()
}
