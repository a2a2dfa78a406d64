//! Field extraction from rank windows.
//!
//! Each rank window is read top to bottom and every line is offered to a
//! fixed sequence of rules; the first rule that claims a line wins it. The
//! result is a [`PartialEntity`]: everything the rendered text can say about
//! one rank, before links, icons and trends are reconciled from markup.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::Keywords;
use crate::entity::Category;
use crate::segment::RankWindow;

static CAPTION_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"for https?://([^/\s]+)/").expect("valid caption regex"));

static PERCENT_SIGNAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[\d,]+(\.\d+)?%$").expect("valid percentage regex"));

/// Text-derived fields of one rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialEntity {
    pub rank: u32,
    pub name: String,
    /// Description for apps, author for models.
    pub secondary_label: Option<String>,
    pub usage_metric: String,
    pub is_new: bool,
    /// Host named by an icon caption such as `Favicon for https://host/`.
    pub caption_domain: Option<String>,
    /// First percentage or novelty line of a model window.
    pub trend_signal: Option<String>,
}

/// True for a signed percentage line such as `15%`, `-4%` or `1,204%`.
pub fn is_percentage(line: &str) -> bool {
    PERCENT_SIGNAL.is_match(line.trim())
}

/// Extracts fields from one window, or `None` when the name or usage metric
/// cannot be found.
pub fn extract_fields(window: &RankWindow, category: Category, keywords: &Keywords) -> Option<PartialEntity> {
    let rules = LineRules::new(keywords);
    let lines = &window.lines;

    let (author, author_index) = match category {
        Category::Model => find_author(lines, &rules),
        Category::App => (None, None),
    };
    let trend_signal = match category {
        Category::Model => find_trend_signal(lines, &rules),
        Category::App => None,
    };

    let mut name: Option<String> = None;
    let mut secondary: Option<String> = None;
    let mut usage_metric: Option<String> = None;
    let mut is_new = trend_signal.as_deref().is_some_and(|signal| rules.is_novelty(signal));
    let mut caption_domain: Option<String> = None;

    for (index, line) in lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if rules.is_caption(line) {
            if caption_domain.is_none()
                && let Some(host) = CAPTION_HOST.captures(line).and_then(|caps| caps.get(1))
            {
                caption_domain = Some(host.as_str().to_string());
            }
            continue;
        }

        if category == Category::Model
            && (rules.is_authorship(line) || Some(index) == author_index || is_percentage(line))
        {
            continue;
        }

        if rules.is_slot_candidate(line) {
            if name.is_none() {
                name = Some(line.to_string());
                continue;
            }
            if secondary.is_none() {
                secondary = Some(line.to_string());
                continue;
            }
        }

        if rules.mentions_metric(line) {
            usage_metric = Some(line.to_string());
            break;
        }

        if rules.is_novelty(line) {
            is_new = true;
        }
    }

    let (Some(name), Some(usage_metric)) = (name, usage_metric) else {
        tracing::debug!(rank = window.rank, "rank window missing name or usage metric");
        return None;
    };

    Some(PartialEntity {
        rank: window.rank,
        name,
        secondary_label: author.or(secondary),
        usage_metric,
        is_new,
        caption_domain,
        trend_signal,
    })
}

/// Line after the first authorship separator, and its index.
fn find_author(lines: &[String], rules: &LineRules<'_>) -> (Option<String>, Option<usize>) {
    let Some(separator) = lines.iter().position(|line| rules.is_authorship(line.trim())) else {
        return (None, None);
    };

    match lines.get(separator + 1).map(|line| line.trim()) {
        Some(author) if !author.is_empty() => (Some(author.to_string()), Some(separator + 1)),
        _ => (None, None),
    }
}

fn find_trend_signal(lines: &[String], rules: &LineRules<'_>) -> Option<String> {
    lines
        .iter()
        .map(|line| line.trim())
        .find(|line| is_percentage(line) || rules.is_novelty(line))
        .map(str::to_string)
}

/// Keyword predicates, lowercased once per window.
struct LineRules<'a> {
    metric: String,
    keywords: &'a Keywords,
}

impl<'a> LineRules<'a> {
    fn new(keywords: &'a Keywords) -> Self {
        Self { metric: keywords.metric.to_lowercase(), keywords }
    }

    fn is_caption(&self, line: &str) -> bool {
        !self.keywords.icon_caption.is_empty() && line.starts_with(&self.keywords.icon_caption)
    }

    fn is_novelty(&self, line: &str) -> bool {
        line.eq_ignore_ascii_case(&self.keywords.novelty)
    }

    fn is_authorship(&self, line: &str) -> bool {
        line == self.keywords.authorship
    }

    fn mentions_metric(&self, line: &str) -> bool {
        line.to_lowercase().contains(&self.metric)
    }

    /// Eligible for the name or secondary slot.
    fn is_slot_candidate(&self, line: &str) -> bool {
        !line.to_lowercase().ends_with(&self.metric) && !self.is_novelty(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(lines: &[&str]) -> RankWindow {
        RankWindow { rank: 1, lines: lines.iter().map(|line| line.to_string()).collect() }
    }

    fn app(lines: &[&str]) -> Option<PartialEntity> {
        extract_fields(&window(lines), Category::App, &Keywords::default())
    }

    fn model(lines: &[&str]) -> Option<PartialEntity> {
        extract_fields(&window(lines), Category::Model, &Keywords::default())
    }

    #[test]
    fn test_app_fields() {
        let entity = app(&["ExampleApp", "A cool app", "42.0Mtokens"]).unwrap();
        assert_eq!(entity.name, "ExampleApp");
        assert_eq!(entity.secondary_label.as_deref(), Some("A cool app"));
        assert_eq!(entity.usage_metric, "42.0Mtokens");
        assert!(!entity.is_new);
        assert_eq!(entity.trend_signal, None);
    }

    #[test]
    fn test_app_caption_domain_and_novelty() {
        let entity = app(&["Favicon for https://www.example.com/", "", "ExampleApp", "new", "Desc", "1.2B tokens"]).unwrap();
        assert_eq!(entity.caption_domain.as_deref(), Some("www.example.com"));
        assert_eq!(entity.name, "ExampleApp");
        assert_eq!(entity.secondary_label.as_deref(), Some("Desc"));
        assert!(entity.is_new);
    }

    #[test]
    fn test_metric_line_ends_window() {
        let entity = app(&["Name", "99Btokens", "new"]).unwrap();
        assert_eq!(entity.secondary_label, None);
        assert!(!entity.is_new);
    }

    #[test]
    fn test_metric_contained_mid_line() {
        let entity = app(&["Name", "Desc", "12B Tokens (est.)"]).unwrap();
        assert_eq!(entity.usage_metric, "12B Tokens (est.)");
    }

    #[test]
    fn test_missing_metric_is_none() {
        assert!(app(&["Name", "Desc", "Other"]).is_none());
    }

    #[test]
    fn test_missing_name_is_none() {
        assert!(app(&["Favicon for https://a.dev/", "new", "5Mtokens"]).is_none());
        assert!(app(&[]).is_none());
    }

    #[test]
    fn test_model_fields() {
        let entity = model(&["Claude Sonnet 4", "by", "anthropic", "120B tokens", "4%"]).unwrap();
        assert_eq!(entity.name, "Claude Sonnet 4");
        assert_eq!(entity.secondary_label.as_deref(), Some("anthropic"));
        assert_eq!(entity.usage_metric, "120B tokens");
        assert_eq!(entity.trend_signal.as_deref(), Some("4%"));
        assert!(!entity.is_new);
    }

    #[test]
    fn test_model_author_overrides_second_line() {
        let entity = model(&["GPT-5", "Flagship", "by", "openai", "80B tokens"]).unwrap();
        assert_eq!(entity.secondary_label.as_deref(), Some("openai"));
    }

    #[test]
    fn test_model_without_separator_keeps_second_line() {
        let entity = model(&["GPT-5", "openai", "80B tokens"]).unwrap();
        assert_eq!(entity.secondary_label.as_deref(), Some("openai"));
        assert_eq!(entity.trend_signal, None);
    }

    #[test]
    fn test_model_novelty_signal_after_metric() {
        let entity = model(&["Grok 4", "by", "x-ai", "3B tokens", "new"]).unwrap();
        assert_eq!(entity.trend_signal.as_deref(), Some("new"));
        assert!(entity.is_new);
    }

    #[test]
    fn test_model_percentage_before_metric_is_not_a_label() {
        let entity = model(&["Gemini 2.5 Pro", "1,204%", "by", "google", "50B tokens"]).unwrap();
        assert_eq!(entity.secondary_label.as_deref(), Some("google"));
        assert_eq!(entity.trend_signal.as_deref(), Some("1,204%"));
    }

    #[test]
    fn test_is_percentage() {
        assert!(is_percentage("15%"));
        assert!(is_percentage("-4%"));
        assert!(is_percentage("1,000%"));
        assert!(is_percentage("2.5%"));
        assert!(!is_percentage("15"));
        assert!(!is_percentage("up 15%"));
    }
}
