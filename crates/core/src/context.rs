//! Per-period extraction state.
//!
//! An [`ExtractionContext`] lives for exactly one time-period scrape. It
//! carries the period label, the ranks accepted so far and, for model
//! scrapes, the link index built once from the period's markup.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;

static MODEL_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href=["']([^"']*/[a-zA-Z0-9\-_]+/[a-zA-Z0-9\-_:\.]+)["']"#).expect("valid model href regex")
});

/// Model page links found in markup, keyed by author.
///
/// Paths keep their first-seen order so lookups are deterministic.
#[derive(Debug, Clone, Default)]
pub struct ModelUrlIndex {
    by_author: HashMap<String, Vec<(String, String)>>,
}

impl ModelUrlIndex {
    /// Indexes every `/<author>/<model>` link, relative or under `site_url`.
    pub fn from_markup(markup: &str, site_url: &str) -> Self {
        let site = site_url.trim_end_matches('/');
        let mut index = Self::default();

        for caps in MODEL_HREF.captures_iter(markup) {
            let Some(href) = caps.get(1).map(|m| m.as_str()) else {
                continue;
            };

            let url = if href.starts_with('/') {
                format!("{}{}", site, href)
            } else if !site.is_empty() && href.starts_with(site) {
                href.to_string()
            } else {
                continue;
            };

            let mut parts = url.rsplit('/');
            let (Some(model_path), Some(author)) = (parts.next(), parts.next()) else {
                continue;
            };
            if author.is_empty() || model_path.is_empty() {
                continue;
            }

            index.insert(author, model_path, &url);
        }

        tracing::debug!(authors = index.by_author.len(), "indexed model links");
        index
    }

    fn insert(&mut self, author: &str, model_path: &str, url: &str) {
        let paths = self.by_author.entry(author.to_string()).or_default();
        match paths.iter_mut().find(|(path, _)| path == model_path) {
            Some(existing) => existing.1 = url.to_string(),
            None => paths.push((model_path.to_string(), url.to_string())),
        }
    }

    pub fn authors(&self) -> usize {
        self.by_author.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_author.is_empty()
    }

    /// Indexed link for a model name shown under `author`.
    ///
    /// Each indexed path is tried in order against the cleaned name: exact
    /// match, then for paths with a variant suffix (`model:free`) containment
    /// of the part before the colon, otherwise plain containment. Containment
    /// is checked in both directions.
    pub fn lookup(&self, model_name: &str, author: &str) -> Option<&str> {
        let paths = self.by_author.get(author).or_else(|| {
            self.by_author
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(author))
                .map(|(_, paths)| paths)
        })?;

        let name = model_slug(model_name);
        paths
            .iter()
            .find(|(path, _)| path_matches(&name, &path.to_lowercase()))
            .map(|(_, url)| url.as_str())
    }

    /// Indexed link, or `<site>/<author>/<slug>` when none matches.
    pub fn model_url(&self, model_name: &str, author: &str, site_url: &str) -> String {
        match self.lookup(model_name, author) {
            Some(url) => url.to_string(),
            None => format!("{}/{}/{}", site_url.trim_end_matches('/'), author, model_slug(model_name)),
        }
    }
}

fn path_matches(name: &str, path: &str) -> bool {
    if name == path {
        return true;
    }

    let contains_either = |a: &str, b: &str| !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a));

    match path.split_once(':') {
        Some((core, _)) => contains_either(name, core),
        None => contains_either(name, path),
    }
}

/// Lowercase, spaces to hyphens, parentheses removed.
pub fn model_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-").replace(['(', ')'], "")
}

/// State for one time-period scrape.
#[derive(Debug)]
pub struct ExtractionContext {
    time_period: String,
    scraped_at: String,
    accepted: BTreeSet<u32>,
    rank_cursor: u32,
    model_urls: ModelUrlIndex,
}

impl ExtractionContext {
    /// Creates a context with an empty model link index.
    pub fn new(time_period: impl Into<String>, scraped_at: impl Into<String>) -> Self {
        Self {
            time_period: time_period.into(),
            scraped_at: scraped_at.into(),
            accepted: BTreeSet::new(),
            rank_cursor: 0,
            model_urls: ModelUrlIndex::default(),
        }
    }

    pub fn with_model_urls(mut self, model_urls: ModelUrlIndex) -> Self {
        self.model_urls = model_urls;
        self
    }

    pub fn time_period(&self) -> &str {
        &self.time_period
    }

    pub fn scraped_at(&self) -> &str {
        &self.scraped_at
    }

    pub fn model_urls(&self) -> &ModelUrlIndex {
        &self.model_urls
    }

    /// Last rank accepted, 0 before any.
    pub fn rank_cursor(&self) -> u32 {
        self.rank_cursor
    }

    pub fn accepted(&self) -> usize {
        self.accepted.len()
    }

    /// Records a rank; false when it was already accepted.
    pub fn accept(&mut self, rank: u32) -> bool {
        if !self.accepted.insert(rank) {
            return false;
        }
        self.rank_cursor = rank;
        true
    }

    /// Forgets accepted ranks before another extraction strategy runs.
    pub fn reset_ranks(&mut self) {
        self.accepted.clear();
        self.rank_cursor = 0;
    }
}
