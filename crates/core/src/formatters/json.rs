use serde_json::{Map, Value};

use crate::Result;
use crate::entity::RankedEntity;
use crate::scrape::ScrapeReport;

/// Configuration for JSON output
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Emit `{time_period: [records]}` instead of a flat list
    pub by_period: bool,
    /// Pretty print JSON output
    pub pretty: bool,
}

fn to_string(value: &Value, pretty: bool) -> Result<String> {
    if pretty { Ok(serde_json::to_string_pretty(value)?) } else { Ok(serde_json::to_string(value)?) }
}

fn records<'a>(entities: impl IntoIterator<Item = &'a RankedEntity>) -> Value {
    Value::Array(entities.into_iter().map(|e| Value::Object(e.to_record())).collect())
}

/// Records of every partition keyed by period.
///
/// Failed periods are kept as empty lists so the export shows every period
/// that was attempted.
pub fn partitions_to_value(report: &ScrapeReport) -> Value {
    let mut periods = Map::new();
    for partition in &report.partitions {
        periods.insert(partition.time_period.clone(), records(&partition.entities));
    }
    Value::Object(periods)
}

/// Flat list of records
pub fn entities_to_json<'a>(entities: impl IntoIterator<Item = &'a RankedEntity>, pretty: bool) -> Result<String> {
    to_string(&records(entities), pretty)
}

/// Convert a scrape report to JSON
pub fn convert_to_json(report: &ScrapeReport, config: &JsonConfig) -> Result<String> {
    if config.by_period {
        to_string(&partitions_to_value(report), config.pretty)
    } else {
        entities_to_json(report.all_entities(), config.pretty)
    }
}

/// JSON formatter with configurable options
pub struct JsonFormatter {
    config: JsonConfig,
}

impl JsonFormatter {
    pub fn new(config: JsonConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, report: &ScrapeReport) -> Result<String> {
        convert_to_json(report, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Category, Direction, Trend};
    use crate::scrape::PeriodResult;

    fn entity(rank: u32, period: &str) -> RankedEntity {
        RankedEntity {
            rank,
            name: format!("Model {}", rank),
            secondary_label: Some("openai".to_string()),
            usage_metric: "12B tokens".to_string(),
            is_new: false,
            trend: Some(Trend::new(Direction::Up, "3%", "3%")),
            target_url: format!("https://openrouter.ai/openai/model-{}", rank),
            domain: "openrouter.ai".to_string(),
            icon_url: String::new(),
            owner_url: "https://openrouter.ai/openai".to_string(),
            category: Category::Model,
            time_period: period.to_string(),
            scraped_at: "2025-06-01T12:00:00Z".to_string(),
        }
    }

    fn report() -> ScrapeReport {
        let mut report = ScrapeReport::new(Category::Model);
        report.partitions.push(PeriodResult {
            time_period: "Top today".to_string(),
            entities: vec![entity(1, "Top today"), entity(2, "Top today")],
            strategy: None,
            error: None,
        });
        report.partitions.push(PeriodResult {
            time_period: "Trending".to_string(),
            entities: Vec::new(),
            strategy: None,
            error: Some("blank page".to_string()),
        });
        report
    }

    #[test]
    fn test_flat_list() {
        let json = convert_to_json(&report(), &JsonConfig::default()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let list = value.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["name"], "Model 1");
        assert_eq!(list[0]["trend_direction"], "up");
        assert_eq!(list[1]["time_period"], "Top today");
    }

    #[test]
    fn test_keyed_by_period_keeps_failed_periods() {
        let config = JsonConfig { by_period: true, pretty: true };
        let json = convert_to_json(&report(), &config).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["Top today"].as_array().unwrap().len(), 2);
        assert!(value["Trending"].as_array().unwrap().is_empty());
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_compact_output() {
        let json = entities_to_json(&[entity(1, "Top today")], false).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains(r#""rank":1"#));
    }

    #[test]
    fn test_json_formatter() {
        let config = JsonConfig { by_period: true, pretty: false };
        let formatter = JsonFormatter::new(config.clone());
        assert_eq!(formatter.convert(&report()).unwrap(), convert_to_json(&report(), &config).unwrap());
    }
}
