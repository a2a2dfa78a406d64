//! Record merging and the extraction fallback chain.
//!
//! Text windows know ranks, names and metrics; markup knows links, icons and
//! trend arrows. The merger pairs the two by rank position and builds the
//! final [`RankedEntity`] values. When the preferred pairing yields nothing,
//! progressively looser strategies are tried in a fixed order and the first
//! non-empty result is kept.

use std::cell::RefCell;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::assets::{self, LinkAssets, domain_of, favicon_service_url};
use crate::config::ScrapeConfig;
use crate::context::{ExtractionContext, ModelUrlIndex};
use crate::domains::DomainMap;
use crate::entity::{Category, RankedEntity, Trend, UNKNOWN};
use crate::fields::{PartialEntity, extract_fields, is_percentage};
use crate::segment::segment;
use crate::snapshot::PageSnapshot;
use crate::trend::resolve_trend;

static SWEEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\.\s*([^<\n]+?)[ \t]*\n\s*([^<\n]+?)\s*([\d.]+[BMK]?tokens)").expect("valid sweep regex")
});

static NEW_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bnew\b").expect("valid novelty regex"));

/// Extraction strategy, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Section-scoped text windows merged with markup links, icons and arrows.
    Combined,
    /// Text windows from the whole page, no markup.
    TextOnly,
    /// Whole-text pattern sweep for `<rank>. <name> <description> <metric>`.
    RegexSweep,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Combined => "combined",
            Strategy::TextOnly => "text_only",
            Strategy::RegexSweep => "regex_sweep",
        }
    }

    /// Strategies tried for a category, most reliable first.
    ///
    /// Models have no section marker, so their combined pass already reads
    /// the whole page and nothing looser is tried after it.
    pub fn chain_for(category: Category) -> &'static [Strategy] {
        match category {
            Category::App => &[Strategy::Combined, Strategy::TextOnly, Strategy::RegexSweep],
            Category::Model => &[Strategy::Combined],
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered strategies, each run only when every earlier one came back empty.
pub struct StrategyChain<'a, T> {
    steps: Vec<(Strategy, Box<dyn FnMut() -> Vec<T> + 'a>)>,
}

impl<'a, T> StrategyChain<'a, T> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn then(mut self, strategy: Strategy, step: impl FnMut() -> Vec<T> + 'a) -> Self {
        self.steps.push((strategy, Box::new(step)));
        self
    }

    /// Runs steps in order and returns the first non-empty result.
    pub fn run(self) -> Option<(Strategy, Vec<T>)> {
        for (strategy, mut step) in self.steps {
            let items = step();
            if !items.is_empty() {
                return Some((strategy, items));
            }
            tracing::debug!(strategy = %strategy, "strategy yielded nothing, falling back");
        }
        None
    }
}

impl<T> Default for StrategyChain<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Entities recovered from one snapshot and the strategy that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub strategy: Option<Strategy>,
    pub entities: Vec<RankedEntity>,
}

/// Runs the category's fallback chain over one snapshot.
///
/// Identical snapshots and configuration always produce identical output.
pub fn extract_period(
    snapshot: &PageSnapshot, config: &ScrapeConfig, domains: &DomainMap, time_period: &str,
) -> Extraction {
    let ctx = RefCell::new(context_for(snapshot, config, time_period));
    let ctx = &ctx;

    let mut chain = StrategyChain::new();
    for strategy in Strategy::chain_for(config.category) {
        let strategy = *strategy;
        chain = chain.then(strategy, move || {
            run_strategy(strategy, snapshot, config, domains, &mut ctx.borrow_mut())
        });
    }

    match chain.run() {
        Some((strategy, entities)) => {
            tracing::info!(
                period = time_period,
                strategy = %strategy,
                count = entities.len(),
                "extracted entities"
            );
            Extraction { strategy: Some(strategy), entities }
        }
        None => {
            tracing::warn!(period = time_period, "every extraction strategy came back empty");
            Extraction { strategy: None, entities: Vec::new() }
        }
    }
}

/// Context for one period; only model scrapes index the page's model links.
fn context_for(snapshot: &PageSnapshot, config: &ScrapeConfig, time_period: &str) -> ExtractionContext {
    let ctx = ExtractionContext::new(time_period, snapshot.timestamp());
    match config.category {
        Category::Model => ctx.with_model_urls(ModelUrlIndex::from_markup(snapshot.html(), &config.site_url)),
        Category::App => ctx,
    }
}

fn run_strategy(
    strategy: Strategy, snapshot: &PageSnapshot, config: &ScrapeConfig, domains: &DomainMap,
    ctx: &mut ExtractionContext,
) -> Vec<RankedEntity> {
    ctx.reset_ranks();

    let entities = match strategy {
        Strategy::Combined => {
            let partials = partials(snapshot.text(), &config.section_marker, config);
            let links = match config.category {
                Category::App => assets::extract(snapshot.html(), config.max_entities, config.icon_window),
                Category::Model => LinkAssets::default(),
            };
            merge(&links, partials, Some(snapshot.html()), ctx, config, domains)
        }
        Strategy::TextOnly => {
            let partials = partials(snapshot.text(), "", config);
            merge(&LinkAssets::default(), partials, None, ctx, config, domains)
        }
        Strategy::RegexSweep => regex_sweep(snapshot.text(), ctx, config),
    };

    finalize(entities, ctx, config.max_entities)
}

fn partials(text: &str, section_marker: &str, config: &ScrapeConfig) -> Vec<PartialEntity> {
    segment(text, section_marker, config.window_lines, config.max_entities)
        .iter()
        .filter_map(|window| {
            let partial = extract_fields(window, config.category, &config.keywords);
            if partial.is_none() {
                tracing::warn!(rank = window.rank, "skipping rank with unreadable fields");
            }
            partial
        })
        .collect()
}

/// Keeps the first entity per rank and at most `max` entities.
fn finalize(entities: Vec<RankedEntity>, ctx: &mut ExtractionContext, max: usize) -> Vec<RankedEntity> {
    let mut kept = Vec::with_capacity(entities.len().min(max));
    for entity in entities {
        if kept.len() == max {
            break;
        }
        if entity.rank as usize > max {
            continue;
        }
        if ctx.accept(entity.rank) {
            kept.push(entity);
        } else {
            tracing::debug!(rank = entity.rank, "dropping repeated rank");
        }
    }
    kept
}

/// Merges text-derived entities with markup-derived links by rank position.
///
/// For rank `r` the link and icon at index `r - 1` are used when present.
/// `markup` enables trend arrows and the model link index; `None` resolves
/// model trends from the percentage signal alone.
pub fn merge(
    links: &LinkAssets, partials: Vec<PartialEntity>, markup: Option<&str>, ctx: &ExtractionContext,
    config: &ScrapeConfig, domains: &DomainMap,
) -> Vec<RankedEntity> {
    partials
        .into_iter()
        .map(|partial| match config.category {
            Category::App => build_app(partial, links, ctx, config),
            Category::Model => build_model(partial, markup, ctx, config, domains),
        })
        .collect()
}

fn build_app(partial: PartialEntity, links: &LinkAssets, ctx: &ExtractionContext, config: &ScrapeConfig) -> RankedEntity {
    let linked = (partial.rank as usize).checked_sub(1).and_then(|index| links.get(index));

    let (target_url, domain) = match (linked, partial.caption_domain.as_deref()) {
        (Some((url, _)), _) => (url.to_string(), domain_of(url)),
        (None, Some(host)) => (format!("https://{}", host), host.to_string()),
        (None, None) => (app_url(&config.site_url, &partial.name), String::new()),
    };

    let icon_url = match (linked, partial.caption_domain.as_deref()) {
        (Some((_, icon)), _) => icon.to_string(),
        (None, Some(host)) => favicon_service_url(&format!("https://{}/", host)),
        (None, None) => String::new(),
    };

    RankedEntity {
        rank: partial.rank,
        name: partial.name,
        secondary_label: partial.secondary_label,
        usage_metric: partial.usage_metric,
        is_new: partial.is_new,
        trend: None,
        target_url,
        domain,
        icon_url,
        owner_url: String::new(),
        category: Category::App,
        time_period: ctx.time_period().to_string(),
        scraped_at: ctx.scraped_at().to_string(),
    }
}

fn build_model(
    partial: PartialEntity, markup: Option<&str>, ctx: &ExtractionContext, config: &ScrapeConfig, domains: &DomainMap,
) -> RankedEntity {
    let signal = partial.trend_signal.as_deref();
    let resolution = resolve_trend(
        &partial.name,
        partial.rank,
        markup.unwrap_or_default(),
        signal,
        &config.markup,
        &config.keywords.novelty,
    );

    let magnitude = signal.filter(|s| is_percentage(s)).unwrap_or(UNKNOWN);
    let trend = Trend::new(resolution.direction, magnitude, signal.unwrap_or_default());

    let site = config.site_url.trim_end_matches('/');
    let (target_url, owner_url, icon_url) = match partial.secondary_label.as_deref() {
        Some(author) => (
            ctx.model_urls().model_url(&partial.name, author, site),
            format!("{}/{}", site, author),
            favicon_service_url(&format!("https://{}", domains.domain_for(author))),
        ),
        None => (String::new(), String::new(), String::new()),
    };

    RankedEntity {
        rank: partial.rank,
        domain: domain_of(&target_url),
        name: partial.name,
        secondary_label: partial.secondary_label,
        usage_metric: partial.usage_metric,
        is_new: partial.is_new,
        trend: Some(trend),
        target_url,
        icon_url,
        owner_url,
        category: Category::Model,
        time_period: ctx.time_period().to_string(),
        scraped_at: ctx.scraped_at().to_string(),
    }
}

/// `<site>/apps/<slug>` with the slug lowercased, spaces hyphenated, and
/// colons and periods removed.
pub fn app_url(site_url: &str, name: &str) -> String {
    let slug = name.to_lowercase().replace(' ', "-").replace([':', '.'], "");
    format!("{}/apps/{}", site_url.trim_end_matches('/'), slug)
}

/// Last-resort pattern sweep over the whole rendered text.
pub fn regex_sweep(text: &str, ctx: &ExtractionContext, config: &ScrapeConfig) -> Vec<RankedEntity> {
    SWEEP
        .captures_iter(text)
        .take(config.max_entities)
        .filter_map(|caps| {
            let rank: u32 = caps.get(1)?.as_str().parse().ok()?;
            let name = caps.get(2)?.as_str().trim().to_string();
            let description = caps.get(3)?.as_str().trim().to_string();
            let usage_metric = caps.get(4)?.as_str().trim().to_string();

            if rank == 0 || name.is_empty() {
                return None;
            }

            Some(RankedEntity {
                rank,
                is_new: NEW_WORD.is_match(&name) || NEW_WORD.is_match(&description),
                target_url: app_url(&config.site_url, &name),
                name,
                secondary_label: (!description.is_empty()).then_some(description),
                usage_metric,
                trend: None,
                domain: String::new(),
                icon_url: String::new(),
                owner_url: String::new(),
                category: config.category,
                time_period: ctx.time_period().to_string(),
                scraped_at: ctx.scraped_at().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Direction;
    use std::cell::Cell;

    fn app_config() -> ScrapeConfig {
        ScrapeConfig::for_category(Category::App)
    }

    fn model_config() -> ScrapeConfig {
        ScrapeConfig::for_category(Category::Model)
    }

    fn ctx(markup: &str) -> ExtractionContext {
        ExtractionContext::new("Today", "2025-01-01T00:00:00Z")
            .with_model_urls(ModelUrlIndex::from_markup(markup, "https://openrouter.ai"))
    }

    fn partial(rank: u32, name: &str) -> PartialEntity {
        PartialEntity {
            rank,
            name: name.to_string(),
            secondary_label: Some("desc".to_string()),
            usage_metric: "1Btokens".to_string(),
            is_new: false,
            caption_domain: None,
            trend_signal: None,
        }
    }

    #[test]
    fn test_end_to_end_example() {
        let snapshot = PageSnapshot::new(
            r#"<a href="/apps?url=https%3A%2F%2Fwww.example.com%2F">ExampleApp</a>"#,
            "Top Apps\n1.\nExampleApp\nA cool app\n42.0Mtokens\n",
        );
        let extraction = extract_period(&snapshot, &app_config(), &DomainMap::builtin(), "Today");

        assert_eq!(extraction.strategy, Some(Strategy::Combined));
        assert_eq!(extraction.entities.len(), 1);
        let entity = &extraction.entities[0];
        assert_eq!(entity.rank, 1);
        assert_eq!(entity.name, "ExampleApp");
        assert_eq!(entity.secondary_label.as_deref(), Some("A cool app"));
        assert_eq!(entity.usage_metric, "42.0Mtokens");
        assert_eq!(entity.target_url, "https://www.example.com/");
        assert_eq!(entity.domain, "www.example.com");
        assert_eq!(entity.time_period, "Today");
        assert!(entity.trend.is_none());
    }

    #[test]
    fn test_positional_merge_and_synthesis() {
        let links = assets::extract(r#"<a href="/apps?url=https%3A%2F%2Fa.dev">A</a>"#, 20, 1000);
        let mut captioned = partial(3, "Gamma Tool");
        captioned.caption_domain = Some("gamma.io".to_string());

        let entities = merge(
            &links,
            vec![partial(1, "Alpha"), partial(2, "Beta v1.2: Pro"), captioned],
            None,
            &ctx(""),
            &app_config(),
            &DomainMap::builtin(),
        );

        assert_eq!(entities[0].target_url, "https://a.dev");
        assert_eq!(entities[0].domain, "a.dev");
        assert_eq!(entities[1].target_url, "https://openrouter.ai/apps/beta-v12-pro");
        assert_eq!(entities[1].domain, "");
        assert_eq!(entities[1].icon_url, "");
        assert_eq!(entities[2].target_url, "https://gamma.io");
        assert_eq!(entities[2].domain, "gamma.io");
        assert!(entities[2].icon_url.contains("url=https%3A%2F%2Fgamma.io%2F"));
    }

    #[test]
    fn test_model_merge() {
        let markup = r#"<div class="text-muted-foreground col-span-1 text-left">1.</div>
            <a href="/anthropic/claude-sonnet-4">Claude Sonnet 4</a>
            <path d="M12 2.25a.75.75 0 0 1 .75.75v16.19l6.22-6.22a.75.75 0 1 1 1.06 1.06l-7.5 7.5a.75.75 0 0 1-1.06 0l-7.5-7.5a.75.75 0 1 1 1.06-1.06l6.22 6.22V3a.75.75 0 0 1 .75-.75Z"/>"#;
        let mut model = partial(1, "Claude Sonnet 4");
        model.secondary_label = Some("anthropic".to_string());
        model.trend_signal = Some("15%".to_string());

        let entities =
            merge(&LinkAssets::default(), vec![model], Some(markup), &ctx(markup), &model_config(), &DomainMap::builtin());
        let entity = &entities[0];
        let trend = entity.trend.as_ref().unwrap();

        assert_eq!(trend.direction, Direction::Down);
        assert_eq!(trend.magnitude, "15%");
        assert_eq!(trend.raw_signal, "15%");
        assert_eq!(entity.target_url, "https://openrouter.ai/anthropic/claude-sonnet-4");
        assert_eq!(entity.owner_url, "https://openrouter.ai/anthropic");
        assert_eq!(entity.domain, "openrouter.ai");
        assert!(entity.icon_url.ends_with("url=https%3A%2F%2Fanthropic.com&size=256"));
    }

    #[test]
    fn test_model_without_markup_uses_percentage() {
        let mut model = partial(2, "Mystery");
        model.secondary_label = Some("Nous Research".to_string());
        model.trend_signal = Some("-8%".to_string());

        let entities =
            merge(&LinkAssets::default(), vec![model], None, &ctx(""), &model_config(), &DomainMap::builtin());
        let entity = &entities[0];

        assert_eq!(entity.trend.as_ref().unwrap().direction, Direction::Down);
        assert_eq!(entity.target_url, "https://openrouter.ai/Nous Research/mystery");
        assert!(entity.icon_url.contains("nousresearch.com"));
    }

    #[test]
    fn test_model_novelty_magnitude_unknown() {
        let mut model = partial(1, "Fresh");
        model.secondary_label = Some("openai".to_string());
        model.trend_signal = Some("new".to_string());
        model.is_new = true;

        let entities =
            merge(&LinkAssets::default(), vec![model], None, &ctx(""), &model_config(), &DomainMap::builtin());
        let trend = entities[0].trend.as_ref().unwrap();
        assert_eq!(trend.direction, Direction::Up);
        assert_eq!(trend.magnitude, UNKNOWN);
        assert_eq!(trend.raw_signal, "new");
    }

    #[test]
    fn test_chain_stops_at_first_non_empty() {
        let text_only_calls = Cell::new(0);
        let sweep_calls = Cell::new(0);

        let outcome = StrategyChain::new()
            .then(Strategy::Combined, || vec![1])
            .then(Strategy::TextOnly, || {
                text_only_calls.set(text_only_calls.get() + 1);
                vec![2]
            })
            .then(Strategy::RegexSweep, || {
                sweep_calls.set(sweep_calls.get() + 1);
                vec![3]
            })
            .run();

        assert_eq!(outcome, Some((Strategy::Combined, vec![1])));
        assert_eq!(text_only_calls.get(), 0);
        assert_eq!(sweep_calls.get(), 0);
    }

    #[test]
    fn test_chain_falls_through_empty_steps() {
        let sweep_calls = Cell::new(0);

        let outcome = StrategyChain::new()
            .then(Strategy::Combined, Vec::new)
            .then(Strategy::TextOnly, || Vec::<u32>::new())
            .then(Strategy::RegexSweep, || {
                sweep_calls.set(sweep_calls.get() + 1);
                vec![7]
            })
            .run();

        assert_eq!(outcome, Some((Strategy::RegexSweep, vec![7])));
        assert_eq!(sweep_calls.get(), 1);
        assert_eq!(StrategyChain::<u32>::new().run(), None);
    }

    #[test]
    fn test_text_only_fallback_ignores_section_marker() {
        let snapshot = PageSnapshot::new("", "Leaders\n1.\nSolo\nDoes things\n5Mtokens\n");
        let extraction = extract_period(&snapshot, &app_config(), &DomainMap::builtin(), "Today");

        assert_eq!(extraction.strategy, Some(Strategy::TextOnly));
        assert_eq!(extraction.entities[0].target_url, "https://openrouter.ai/apps/solo");
    }

    #[test]
    fn test_regex_sweep_fallback() {
        let snapshot = PageSnapshot::new(
            "",
            "1. Kilo Code\nAI coding agent for VS Code\n99.2Btokens\n2. Cline\nNew autonomous agent\n41Btokens",
        );
        let extraction = extract_period(&snapshot, &app_config(), &DomainMap::builtin(), "This Week");

        assert_eq!(extraction.strategy, Some(Strategy::RegexSweep));
        assert_eq!(extraction.entities.len(), 2);
        assert_eq!(extraction.entities[0].rank, 1);
        assert_eq!(extraction.entities[0].name, "Kilo Code");
        assert_eq!(extraction.entities[0].secondary_label.as_deref(), Some("AI coding agent for VS Code"));
        assert_eq!(extraction.entities[0].usage_metric, "99.2Btokens");
        assert_eq!(extraction.entities[0].target_url, "https://openrouter.ai/apps/kilo-code");
        assert!(!extraction.entities[0].is_new);
        assert!(extraction.entities[1].is_new);
        assert_eq!(extraction.entities[1].time_period, "This Week");
    }

    #[test]
    fn test_sweep_name_stays_on_its_line() {
        let ctx = ctx("");
        assert!(regex_sweep("1. ExampleApp A cool app 42.0Mtokens", &ctx, &app_config()).is_empty());

        let entities = regex_sweep("1. ExampleApp\nA cool app 42.0Mtokens", &ctx, &app_config());
        assert_eq!(entities[0].name, "ExampleApp");
        assert_eq!(entities[0].secondary_label.as_deref(), Some("A cool app"));
        assert_eq!(entities[0].usage_metric, "42.0Mtokens");
    }

    #[test]
    fn test_models_use_single_strategy() {
        assert_eq!(Strategy::chain_for(Category::Model), &[Strategy::Combined]);

        let snapshot = PageSnapshot::new("", "1. Orphan\nsomething 5Btokens");
        let extraction = extract_period(&snapshot, &model_config(), &DomainMap::builtin(), "Top today");
        assert_eq!(extraction.strategy, None);
    }

    #[test]
    fn test_highest_rank_model() {
        let config = ScrapeConfig::builder().category(Category::Model).max_entities(usize::MAX).build();
        let snapshot = PageSnapshot::new("", "4294967295.\nName\nby\nacme\n1B tokens\n5%");
        let extraction = extract_period(&snapshot, &config, &DomainMap::builtin(), "Top today");

        assert_eq!(extraction.entities.len(), 1);
        assert_eq!(extraction.entities[0].rank, u32::MAX);
        assert_eq!(extraction.entities[0].trend.as_ref().unwrap().direction, Direction::Up);
    }

    #[test]
    fn test_model_links_indexed_for_models_only() {
        let snapshot = PageSnapshot::new(r#"<a href="/anthropic/claude-sonnet-4">Claude</a>"#, "");

        assert!(context_for(&snapshot, &app_config(), "Today").model_urls().is_empty());
        assert_eq!(context_for(&snapshot, &model_config(), "Top today").model_urls().authors(), 1);
    }

    #[test]
    fn test_nothing_extracted() {
        let snapshot = PageSnapshot::new("<div></div>", "Nothing to see");
        let extraction = extract_period(&snapshot, &app_config(), &DomainMap::builtin(), "Today");
        assert_eq!(extraction.strategy, None);
        assert!(extraction.entities.is_empty());
    }

    #[test]
    fn test_repeated_ranks_keep_first() {
        let snapshot = PageSnapshot::new("", "Top Apps\n1.\nFirst\n1Btokens\n1.\nSecond\n2Btokens\n2.\nThird\n3Btokens");
        let extraction = extract_period(&snapshot, &app_config(), &DomainMap::builtin(), "Today");

        let names: Vec<_> = extraction.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Third"]);
    }

    #[test]
    fn test_max_entities_caps_result() {
        let text = (1..=6).map(|i| format!("{}.\nApp{}\n{}Mtokens\n", i, i, i)).collect::<String>();
        let config = ScrapeConfig::builder().section_marker("").max_entities(4).build();
        let snapshot = PageSnapshot::new("", text);
        let extraction = extract_period(&snapshot, &config, &DomainMap::builtin(), "Today");
        assert_eq!(extraction.entities.len(), 4);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let snapshot = PageSnapshot::new(
            r#"<a href="/apps?url=https%3A%2F%2Fa.dev">A</a>"#,
            "Top Apps\n1.\nA\nFirst\n1Btokens\n2.\nB\n2Btokens",
        );
        let config = app_config();
        let domains = DomainMap::builtin();
        let first = extract_period(&snapshot, &config, &domains, "Today");
        let second = extract_period(&snapshot, &config, &domains, "Today");
        assert_eq!(
            serde_json::to_string(&first.entities).unwrap(),
            serde_json::to_string(&second.entities).unwrap()
        );
    }
}
