use std::fmt::Write;

use crate::entity::{Category, RankedEntity, UNKNOWN};
use crate::scrape::ScrapeReport;

/// Configuration for plain text output
#[derive(Debug, Clone)]
pub struct TextConfig {
    /// Width of the rule lines framing the listing
    pub line_width: usize,

    /// Append per-period counts and the overall total
    pub include_summary: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self { line_width: 100, include_summary: true }
    }
}

/// Plain text formatter for console listings
pub struct TextFormatter {
    config: TextConfig,
}

impl TextFormatter {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, report: &ScrapeReport) -> String {
        convert_to_text(report, &self.config)
    }
}

fn title(category: Category) -> &'static str {
    match category {
        Category::App => "TOP APPS",
        Category::Model => "TOP MODELS",
    }
}

fn app_row(entity: &RankedEntity) -> String {
    let new = if entity.is_new { " [NEW]" } else { "" };
    format!(
        "{:2}. {:<30} | {:<40} | {:<12}{}",
        entity.rank,
        entity.name,
        entity.secondary_label.as_deref().unwrap_or(UNKNOWN),
        entity.usage_metric,
        new
    )
}

fn model_row(entity: &RankedEntity) -> String {
    let trend = match &entity.trend {
        Some(t) => format!("[{}] {} {} ({})", t.color.to_uppercase(), t.icon, t.magnitude, t.direction.as_str()),
        None => format!("[UNKNOWN] ? {} (unknown)", UNKNOWN),
    };
    format!(
        "{:2}. {:<30} | by {:<15} | {:<12} | {}",
        entity.rank,
        entity.name,
        entity.secondary_label.as_deref().unwrap_or(UNKNOWN),
        entity.usage_metric,
        trend
    )
}

/// Render a report as the console listing, one section per period
pub fn convert_to_text(report: &ScrapeReport, config: &TextConfig) -> String {
    let rule = "=".repeat(config.line_width);
    let mut output = String::new();

    let _ = writeln!(output, "{}", rule);
    let _ = writeln!(output, "OPENROUTER {}", title(report.category));
    let _ = writeln!(output, "{}", rule);

    if let Some(error) = &report.error {
        let _ = writeln!(output, "ERROR: {}", error);
    }

    for partition in &report.partitions {
        let _ = writeln!(output, "\n{}:", partition.time_period.to_uppercase());
        let _ = writeln!(output, "{}", "-".repeat(config.line_width.min(80)));

        if let Some(error) = &partition.error {
            let _ = writeln!(output, "ERROR: {}", error);
        } else if partition.entities.is_empty() {
            let _ = writeln!(output, "(no entries)");
        }

        for entity in &partition.entities {
            let row = match entity.category {
                Category::App => app_row(entity),
                Category::Model => model_row(entity),
            };
            let _ = writeln!(output, "{}", row);
        }
    }

    if config.include_summary {
        let _ = writeln!(output, "\n{}", rule);
        for partition in &report.partitions {
            let _ = writeln!(output, "{}: {}", partition.time_period, partition.entities.len());
        }
        let _ = writeln!(output, "Total: {}", report.total());
    }
    let _ = write!(output, "{}", rule);

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Direction, Trend};
    use crate::scrape::PeriodResult;

    fn entity(category: Category, rank: u32, name: &str, label: &str) -> RankedEntity {
        RankedEntity {
            rank,
            name: name.to_string(),
            secondary_label: Some(label.to_string()),
            usage_metric: "42.0Mtokens".to_string(),
            is_new: false,
            trend: category.has_trend().then(|| Trend::new(Direction::Down, "12%", "12%")),
            target_url: String::new(),
            domain: String::new(),
            icon_url: String::new(),
            owner_url: String::new(),
            category,
            time_period: "Today".to_string(),
            scraped_at: String::new(),
        }
    }

    fn report(category: Category, entities: Vec<RankedEntity>) -> ScrapeReport {
        let mut report = ScrapeReport::new(category);
        report.partitions.push(PeriodResult { time_period: "Today".to_string(), entities, strategy: None, error: None });
        report
    }

    #[test]
    fn test_app_rows() {
        let mut new_app = entity(Category::App, 2, "Cline", "Autonomous agent");
        new_app.is_new = true;
        let report = report(Category::App, vec![entity(Category::App, 1, "ExampleApp", "A cool app"), new_app]);

        let text = convert_to_text(&report, &TextConfig::default());
        assert!(text.contains("OPENROUTER TOP APPS"));
        assert!(text.contains("\nTODAY:\n"));
        assert!(text.contains(&format!(" 1. {:<30} | {:<40} | {:<12}\n", "ExampleApp", "A cool app", "42.0Mtokens")));
        assert!(text.contains("42.0Mtokens  [NEW]"));
        assert!(text.contains("Total: 2"));
    }

    #[test]
    fn test_model_rows_show_trend() {
        let report = report(Category::Model, vec![entity(Category::Model, 3, "GPT-4o", "openai")]);
        let text = convert_to_text(&report, &TextConfig::default());
        assert!(text.contains("| by openai "));
        assert!(text.contains("[RED] v 12% (down)"));
    }

    #[test]
    fn test_failed_period_and_no_summary() {
        let mut report = ScrapeReport::new(Category::App);
        report.partitions.push(PeriodResult {
            time_period: "This Week".to_string(),
            entities: Vec::new(),
            strategy: None,
            error: Some("blank page".to_string()),
        });

        let config = TextConfig { line_width: 20, include_summary: false };
        let text = TextFormatter::new(config).convert(&report);
        assert!(text.contains("ERROR: blank page"));
        assert!(!text.contains("Total:"));
        assert!(text.starts_with(&"=".repeat(20)));
    }
}
