//! Scrape configuration.
//!
//! [`ScrapeConfig`] gathers every tunable of a scrape: the category, the
//! time periods to visit, the maximum number of ranks kept, the window sizes
//! used by the extractors, and the renderer waits. [`MarkupProfile`] and
//! [`Keywords`] hold the literal page anchors the extractors look for, so a
//! page redesign is a configuration change rather than a code change.
//!
//! # Example
//!
//! ```rust
//! use rankwatch_core::{Category, ScrapeConfig};
//!
//! let config = ScrapeConfig::builder()
//!     .category(Category::Model)
//!     .max_entities(10)
//!     .build();
//! assert_eq!(config.periods.len(), 4);
//! ```

use std::time::Duration;

use crate::entity::Category;

/// Literal markup anchors used to isolate per-rank blocks and read trend icons.
#[derive(Debug, Clone)]
pub struct MarkupProfile {
    /// Rank marker; `{rank}` is replaced with the rank number.
    pub rank_marker: String,
    /// Looser rank marker tried when `rank_marker` never occurs.
    pub alt_rank_marker: String,
    /// Markup that closes a rank block when no next-rank marker follows.
    pub block_terminator: String,
    /// Characters scanned past a rank marker when no next-rank marker exists.
    pub block_lookahead: usize,
    /// Vector path drawn by the upward trend icon.
    pub up_icon_path: String,
    /// Vector path drawn by the downward trend icon.
    pub down_icon_path: String,
}

impl Default for MarkupProfile {
    fn default() -> Self {
        Self {
            rank_marker: r#"<div class="text-muted-foreground col-span-1 text-left">{rank}.</div>"#.to_string(),
            alt_rank_marker: r#"col-span-1 text-left">{rank}."#.to_string(),
            block_terminator: r#"</div></div><div class="grid grid-cols-12 items-center">"#.to_string(),
            block_lookahead: 2000,
            up_icon_path: "M11.47 2.47a.75.75 0 0 1 1.06 0l7.5 7.5a.75.75 0 1 1-1.06 1.06l-6.22-6.22V21a.75.75 0 0 1-1.5 0V4.81l-6.22 6.22a.75.75 0 1 1-1.06-1.06l7.5-7.5Z".to_string(),
            down_icon_path: "M12 2.25a.75.75 0 0 1 .75.75v16.19l6.22-6.22a.75.75 0 1 1 1.06 1.06l-7.5 7.5a.75.75 0 0 1-1.06 0l-7.5-7.5a.75.75 0 1 1 1.06-1.06l6.22 6.22V3a.75.75 0 0 1 .75-.75Z".to_string(),
        }
    }
}

impl MarkupProfile {
    pub fn rank_marker_for(&self, rank: u32) -> String {
        self.rank_marker.replace("{rank}", &rank.to_string())
    }

    pub fn alt_rank_marker_for(&self, rank: u32) -> String {
        self.alt_rank_marker.replace("{rank}", &rank.to_string())
    }
}

/// Words and prefixes recognised in rendered text.
#[derive(Debug, Clone)]
pub struct Keywords {
    /// Suffix of the usage-metric line (`"tokens"`).
    pub metric: String,
    /// Line that flags an entity without prior history (`"new"`).
    pub novelty: String,
    /// Prefix of icon captions that carry no entity data (`"Favicon"`).
    pub icon_caption: String,
    /// Line preceding a model's author (`"by"`).
    pub authorship: String,
}

impl Default for Keywords {
    fn default() -> Self {
        Self {
            metric: "tokens".to_string(),
            novelty: "new".to_string(),
            icon_caption: "Favicon".to_string(),
            authorship: "by".to_string(),
        }
    }
}

/// Configuration for one scrape run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Leaderboard being scraped (default: apps).
    pub category: Category,

    /// Time period labels visited in order.
    pub periods: Vec<String>,

    /// Maximum ranks kept per period (default: 20).
    pub max_entities: usize,

    /// Text that opens the ranked section; empty means the whole text.
    pub section_marker: String,

    /// Lines collected after each rank marker (default: 10).
    pub window_lines: usize,

    /// Characters searched on each side of a link for its icon (default: 1000).
    pub icon_window: usize,

    /// Site root used to build synthesized URLs.
    pub site_url: String,

    /// Path of the rankings page below `site_url`.
    pub rankings_path: String,

    /// Pause after each renderer interaction.
    pub settle: Duration,

    /// Upper bound on waiting for the list to render (default: 30s).
    pub ready_timeout: Duration,

    /// Polling interval while waiting for the list (default: 2s).
    pub poll_interval: Duration,

    /// Markup substrings whose presence means the list has rendered.
    pub ready_markers: Vec<String>,

    /// Label of the control that reveals the full list, if any.
    pub expand_label: Option<String>,

    /// Label of the control that opens the category's section, if any.
    pub section_label: Option<String>,

    pub markup: MarkupProfile,

    pub keywords: Keywords,
}

impl ScrapeConfig {
    /// Defaults for the given category.
    pub fn for_category(category: Category) -> Self {
        let base = Self {
            category,
            periods: Vec::new(),
            max_entities: 20,
            section_marker: String::new(),
            window_lines: 10,
            icon_window: 1000,
            site_url: "https://openrouter.ai".to_string(),
            rankings_path: "/rankings".to_string(),
            settle: Duration::from_secs(5),
            ready_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(2),
            ready_markers: Vec::new(),
            expand_label: None,
            section_label: None,
            markup: MarkupProfile::default(),
            keywords: Keywords::default(),
        };

        match category {
            Category::App => Self {
                periods: vec!["Today".into(), "This Week".into(), "This Month".into()],
                section_marker: "Top Apps".to_string(),
                ready_markers: vec!["Top Apps".into()],
                section_label: Some("Apps".to_string()),
                ..base
            },
            Category::Model => Self {
                periods: vec![
                    "Top today".into(),
                    "Top this week".into(),
                    "Top this month".into(),
                    "Trending".into(),
                ],
                ready_markers: vec!["Anthropic: Claude".into(), "Google: Gemini".into(), "OpenAI: GPT".into()],
                expand_label: Some("Show more".to_string()),
                ..base
            },
        }
    }

    /// Creates a new builder for ScrapeConfig.
    pub fn builder() -> ScrapeConfigBuilder {
        ScrapeConfigBuilder::new()
    }

    /// Absolute URL of the rankings page.
    pub fn rankings_url(&self) -> String {
        format!("{}{}", self.site_url.trim_end_matches('/'), self.rankings_path)
    }

    /// Zero every renderer wait. Used for replayed and static snapshots.
    pub fn without_waits(mut self) -> Self {
        self.settle = Duration::ZERO;
        self.ready_timeout = Duration::ZERO;
        self.poll_interval = Duration::ZERO;
        self
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self::for_category(Category::App)
    }
}

/// Builder for ScrapeConfig.
///
/// Setting the category resets category-dependent defaults (periods, section
/// marker, ready markers, expand and section labels); set those afterwards to
/// override them.
///
/// # Example
///
/// ```rust
/// use rankwatch_core::{Category, ScrapeConfig};
///
/// let config = ScrapeConfig::builder()
///     .category(Category::App)
///     .periods(["Today"])
///     .window_lines(8)
///     .build();
/// assert_eq!(config.periods, vec!["Today".to_string()]);
/// ```
pub struct ScrapeConfigBuilder {
    config: ScrapeConfig,
}

impl ScrapeConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ScrapeConfig::default() }
    }

    /// Sets the category, resetting category-dependent defaults.
    pub fn category(mut self, category: Category) -> Self {
        let previous = self.config;
        self.config = ScrapeConfig {
            max_entities: previous.max_entities,
            window_lines: previous.window_lines,
            icon_window: previous.icon_window,
            site_url: previous.site_url,
            rankings_path: previous.rankings_path,
            settle: previous.settle,
            ready_timeout: previous.ready_timeout,
            poll_interval: previous.poll_interval,
            markup: previous.markup,
            keywords: previous.keywords,
            ..ScrapeConfig::for_category(category)
        };
        self
    }

    pub fn periods<I, S>(mut self, periods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.periods = periods.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_entities(mut self, value: usize) -> Self {
        self.config.max_entities = value;
        self
    }

    pub fn section_marker(mut self, value: impl Into<String>) -> Self {
        self.config.section_marker = value.into();
        self
    }

    pub fn window_lines(mut self, value: usize) -> Self {
        self.config.window_lines = value;
        self
    }

    pub fn icon_window(mut self, value: usize) -> Self {
        self.config.icon_window = value;
        self
    }

    pub fn block_lookahead(mut self, value: usize) -> Self {
        self.config.markup.block_lookahead = value;
        self
    }

    pub fn site_url(mut self, value: impl Into<String>) -> Self {
        self.config.site_url = value.into();
        self
    }

    pub fn rankings_path(mut self, value: impl Into<String>) -> Self {
        self.config.rankings_path = value.into();
        self
    }

    pub fn settle(mut self, value: Duration) -> Self {
        self.config.settle = value;
        self
    }

    pub fn ready_timeout(mut self, value: Duration) -> Self {
        self.config.ready_timeout = value;
        self
    }

    pub fn poll_interval(mut self, value: Duration) -> Self {
        self.config.poll_interval = value;
        self
    }

    pub fn ready_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.ready_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn expand_label(mut self, value: Option<String>) -> Self {
        self.config.expand_label = value;
        self
    }

    pub fn section_label(mut self, value: Option<String>) -> Self {
        self.config.section_label = value;
        self
    }

    pub fn markup(mut self, value: MarkupProfile) -> Self {
        self.config.markup = value;
        self
    }

    pub fn keywords(mut self, value: Keywords) -> Self {
        self.config.keywords = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ScrapeConfig {
        self.config
    }
}

impl Default for ScrapeConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
