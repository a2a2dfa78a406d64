//! Ranked entity output types.
//!
//! This module defines [`RankedEntity`], the fully reconciled record produced
//! for every rank of a leaderboard, together with the category and trend
//! types it carries and the flat record mapping handed to data sinks.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{RankwatchError, Result};

/// Leaderboard category being scraped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Applications ranked by token usage. No trend semantics.
    App,
    /// AI models ranked by token usage, with a period-over-period trend.
    Model,
}

impl Category {
    /// Destination table used by data sinks.
    pub fn table_name(&self) -> &'static str {
        match self {
            Category::App => "openrouter_apps",
            Category::Model => "openrouter_models",
        }
    }

    /// Whether entities of this category carry a [`Trend`].
    pub fn has_trend(&self) -> bool {
        matches!(self, Category::Model)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::App => "app",
            Category::Model => "model",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = RankwatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "app" | "apps" => Ok(Category::App),
            "model" | "models" => Ok(Category::Model),
            _ => Err(RankwatchError::ConfigError(format!(
                "Invalid category: {}. Valid options: apps, models",
                s
            ))),
        }
    }
}

/// Direction of a period-over-period trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stable,
    Unknown,
}

impl Direction {
    /// Display glyph for the direction.
    pub fn icon(&self) -> &'static str {
        match self {
            Direction::Up => "^",
            Direction::Down => "v",
            Direction::Stable => "->",
            Direction::Unknown => "?",
        }
    }

    /// Display color for the direction.
    pub fn color(&self) -> &'static str {
        match self {
            Direction::Up => "green",
            Direction::Down => "red",
            Direction::Stable | Direction::Unknown => "gray",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Stable => "stable",
            Direction::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trend attached to model entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trend {
    pub direction: Direction,
    /// Percentage text such as `"15%"`, or `"Unknown"`.
    pub magnitude: String,
    /// The raw signal line the trend was read from (`"15%"`, `"new"`, or empty).
    pub raw_signal: String,
    pub icon: String,
    pub color: String,
}

impl Trend {
    pub fn new(direction: Direction, magnitude: impl Into<String>, raw_signal: impl Into<String>) -> Self {
        Self {
            direction,
            magnitude: magnitude.into(),
            raw_signal: raw_signal.into(),
            icon: direction.icon().to_string(),
            color: direction.color().to_string(),
        }
    }
}

/// Sentinel used when a free-form field cannot be recovered.
pub const UNKNOWN: &str = "Unknown";

/// Field order of [`RankedEntity::to_record`], used for tabular exports.
pub const RECORD_FIELDS: &[&str] = &[
    "rank",
    "name",
    "secondary_label",
    "usage_metric",
    "is_new",
    "trend_direction",
    "trend_magnitude",
    "trend_signal",
    "trend_icon",
    "trend_color",
    "target_url",
    "domain",
    "icon_url",
    "owner_url",
    "category",
    "time_period",
    "scraped_at",
];

/// One reconciled leaderboard row.
///
/// Entities are built in one step by the record merger and never mutated
/// afterwards. Within a single `(category, time_period)` partition ranks
/// are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntity {
    /// 1-based position on the leaderboard.
    pub rank: u32,
    pub name: String,
    /// Description for apps, author for models.
    pub secondary_label: Option<String>,
    /// Usage text such as `"3.54B tokens"`, or [`UNKNOWN`].
    pub usage_metric: String,
    /// True when the entity has no prior-period history.
    pub is_new: bool,
    /// Present for models only.
    pub trend: Option<Trend>,
    /// Canonical link for the entity; empty when unrecoverable.
    pub target_url: String,
    /// Host of `target_url`; empty when unknown.
    pub domain: String,
    /// Icon-service image URL; empty when unrecoverable.
    pub icon_url: String,
    /// Author page for models; empty for apps.
    pub owner_url: String,
    pub category: Category,
    pub time_period: String,
    /// RFC 3339 capture time of the snapshot this entity came from.
    pub scraped_at: String,
}

impl RankedEntity {
    /// Flattens the entity into the mapping sent to data sinks.
    ///
    /// Keys follow [`RECORD_FIELDS`]; absent optional values become JSON null.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("rank".into(), Value::from(self.rank));
        record.insert("name".into(), Value::from(self.name.clone()));
        record.insert("secondary_label".into(), self.secondary_label.clone().map_or(Value::Null, Value::from));
        record.insert("usage_metric".into(), Value::from(self.usage_metric.clone()));
        record.insert("is_new".into(), Value::from(self.is_new));

        let trend = self.trend.as_ref();
        record.insert("trend_direction".into(), trend.map_or(Value::Null, |t| Value::from(t.direction.as_str())));
        record.insert("trend_magnitude".into(), trend.map_or(Value::Null, |t| Value::from(t.magnitude.clone())));
        record.insert("trend_signal".into(), trend.map_or(Value::Null, |t| Value::from(t.raw_signal.clone())));
        record.insert("trend_icon".into(), trend.map_or(Value::Null, |t| Value::from(t.icon.clone())));
        record.insert("trend_color".into(), trend.map_or(Value::Null, |t| Value::from(t.color.clone())));

        record.insert("target_url".into(), Value::from(self.target_url.clone()));
        record.insert("domain".into(), Value::from(self.domain.clone()));
        record.insert("icon_url".into(), Value::from(self.icon_url.clone()));
        record.insert("owner_url".into(), Value::from(self.owner_url.clone()));
        record.insert("category".into(), Value::from(self.category.as_str()));
        record.insert("time_period".into(), Value::from(self.time_period.clone()));
        record.insert("scraped_at".into(), Value::from(self.scraped_at.clone()));
        record
    }
}
