pub mod assets;
pub mod config;
pub mod context;
pub mod domains;
pub mod entity;
pub mod error;
pub mod fetch;
pub mod fields;
pub mod formatters;
pub mod merge;
pub mod publish;
pub mod renderer;
pub mod scrape;
pub mod segment;
pub mod sink;
pub mod snapshot;
pub mod trend;

pub use assets::{LinkAssets, domain_of, favicon_service_url};
pub use config::{Keywords, MarkupProfile, ScrapeConfig, ScrapeConfigBuilder};
#[doc(hidden)]
pub use context::{ExtractionContext, ModelUrlIndex};
pub use domains::{DomainMap, DomainMapBuilder};
pub use entity::{Category, Direction, RECORD_FIELDS, RankedEntity, Trend, UNKNOWN};
pub use error::{RankwatchError, Result};
#[cfg(feature = "fetch")]
pub use fetch::HttpRenderer;
pub use fetch::{FetchConfig, fetch_file, fetch_stdin};
#[doc(hidden)]
pub use fields::{PartialEntity, extract_fields};
pub use formatters::{JsonConfig, JsonFormatter, TextConfig, TextFormatter};
pub use formatters::{convert_to_csv, convert_to_json, convert_to_text, write_csv};
pub use merge::{Extraction, Strategy, StrategyChain, extract_period, merge};
pub use publish::{PublishOutcome, export_structured, publish, publish_to};
pub use renderer::{
    ClickStrategy, Renderer, ReplayRenderer, ScrollPosition, StaticRenderer, wait_for_markup, wait_until,
};
pub use scrape::{PeriodResult, ScrapeReport, Scraper, scrape};
#[doc(hidden)]
pub use segment::{RankWindow, segment};
#[cfg(feature = "sqlite")]
pub use sink::SqliteSink;
pub use sink::{DataSink, MemorySink, Record};
pub use snapshot::{PageSnapshot, render_text};
pub use trend::{TrendResolution, TrendRule, resolve_trend};
