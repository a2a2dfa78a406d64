mod echo;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use rankwatch_core::{
    Category, DomainMap, FetchConfig, HttpRenderer, JsonConfig, PublishOutcome, Renderer, ReplayRenderer,
    ScrapeConfig, ScrapeReport, SqliteSink, StaticRenderer, TextConfig, convert_to_csv, convert_to_json,
    convert_to_text, export_structured, fetch_file, fetch_stdin, publish_to,
};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::echo::{
    print_banner, print_error, print_info, print_publish_outcome, print_report_summary, print_step, print_success,
    print_warning,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for scraped records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
    JsonPeriods,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "json-periods" => Ok(Self::JsonPeriods),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Invalid format: {}. Valid options: table, json, json-periods, csv", s)),
        }
    }
}

fn parse_category(s: &str) -> Result<Category, String> {
    Category::from_str(s).map_err(|e| e.to_string())
}

/// Scrape ranked app and model leaderboards into structured records
#[derive(Parser, Debug)]
#[command(name = "rankwatch")]
#[command(author = "Rankwatch Contributors")]
#[command(version = "0.3.0")]
#[command(about = "Scrape ranked app and model leaderboards", long_about = None)]
struct Args {
    /// Rankings URL, snapshot directory, HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Leaderboard to scrape (apps, models)
    #[arg(short, long, default_value = "apps", value_name = "CATEGORY", value_parser = parse_category)]
    category: Category,

    /// Maximum entries kept per period
    #[arg(short, long, default_value = "20", value_name = "NUM")]
    max: usize,

    /// Time period label to scrape; repeat for several (default: all for the category)
    #[arg(short, long, value_name = "LABEL")]
    period: Vec<String>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Directory holding a custom domains.txt
    #[arg(long, value_name = "DIR")]
    domains: Option<PathBuf>,

    /// Store records in this SQLite database
    #[arg(long, value_name = "FILE")]
    sqlite: Option<PathBuf>,

    /// Table to store records in (default: openrouter_apps or openrouter_models)
    #[arg(long, value_name = "NAME")]
    table: Option<String>,

    /// Directory for the JSON export when storing fails
    #[arg(long, default_value = ".", value_name = "DIR")]
    fallback_dir: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (table, json, json-periods, csv)
    #[arg(short, long, default_value = "table", value_name = "FORMAT")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(io::stderr)
        .init();
}

fn build_config(args: &Args) -> anyhow::Result<ScrapeConfig> {
    let mut builder = ScrapeConfig::builder().category(args.category).max_entities(args.max);

    if !args.period.is_empty() {
        builder = builder.periods(args.period.iter().cloned());
    }

    if is_url(&args.input) {
        let url = Url::parse(&args.input).with_context(|| format!("Invalid URL: {}", args.input))?;
        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        builder = builder.site_url(url.origin().ascii_serialization()).rankings_path(path);
    }

    Ok(builder.build().without_waits())
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Reads an HTML capture and its sibling `.txt` rendering when one exists.
fn static_from_file(path: &Path) -> anyhow::Result<StaticRenderer> {
    let html =
        fetch_file(&path.to_string_lossy()).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let text_path = path.with_extension("txt");

    if text_path.is_file() {
        let text = fetch_file(&text_path.to_string_lossy())
            .with_context(|| format!("Failed to read file: {}", text_path.display()))?;
        Ok(StaticRenderer::new(html, text))
    } else {
        Ok(StaticRenderer::from_markup(html))
    }
}

fn open_renderer(args: &Args) -> anyhow::Result<Box<dyn Renderer>> {
    if args.input == "-" {
        let html = fetch_stdin().context("Failed to read from stdin")?;
        return Ok(Box::new(StaticRenderer::from_markup(html)));
    }

    if is_url(&args.input) {
        let mut config = FetchConfig { timeout: args.timeout, ..Default::default() };
        if let Some(user_agent) = &args.user_agent {
            config.user_agent = user_agent.clone();
        }
        let renderer = HttpRenderer::new(config).context("Failed to create HTTP client")?;
        return Ok(Box::new(renderer));
    }

    let path = Path::new(&args.input);
    if path.is_dir() {
        let renderer = ReplayRenderer::open(path)
            .with_context(|| format!("Failed to open snapshot directory: {}", path.display()))?;
        Ok(Box::new(renderer))
    } else {
        Ok(Box::new(static_from_file(path)?))
    }
}

fn render_output(report: &ScrapeReport, format: OutputFormat) -> anyhow::Result<String> {
    let output = match format {
        OutputFormat::Table => convert_to_text(report, &TextConfig::default()),
        OutputFormat::Json => convert_to_json(report, &JsonConfig { by_period: false, pretty: true })?,
        OutputFormat::JsonPeriods => convert_to_json(report, &JsonConfig { by_period: true, pretty: true })?,
        OutputFormat::Csv => convert_to_csv(report)?,
    };
    Ok(output)
}

fn store(report: &ScrapeReport, database: &Path, table: Option<&str>, fallback_dir: &Path) -> anyhow::Result<()> {
    let table = table.unwrap_or_else(|| report.category.table_name());
    let outcome = match SqliteSink::open(database) {
        Ok(mut sink) => publish_to(report, &mut sink, table, fallback_dir).context("Failed to export records")?,
        Err(e) => {
            print_warning(&format!("Could not open {}: {}", database.display(), e));
            let path =
                export_structured(report, fallback_dir, OffsetDateTime::now_utc()).context("Failed to export records")?;
            PublishOutcome::Exported(path)
        }
    };
    print_publish_outcome(&outcome);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let config = build_config(&args)?;
    tracing::debug!(url = %config.rankings_url(), category = %config.category, "resolved rankings page");
    let domains = DomainMap::load(args.domains.as_deref()).context("Failed to load domain map")?;

    if args.verbose {
        print_step(1, 3, &format!("Opening {}", args.input.bright_white()));
        eprintln!("  {} {}", "Category:".dimmed(), config.category.to_string().bright_white());
        eprintln!("  {} {}", "Periods:".dimmed(), config.periods.join(", ").bright_white());
        eprintln!("  {} {}\n", "Domains:".dimmed(), domains.len().to_string().bright_white());
    }

    let mut renderer = open_renderer(&args)?;

    if args.verbose {
        print_step(2, 3, "Scraping periods");
    }

    let report = rankwatch_core::scrape(renderer.as_mut(), &config, &domains);
    if let Some(error) = &report.error {
        print_error(error);
        anyhow::bail!("No usable page snapshot from {}", args.input);
    }

    if args.verbose {
        print_report_summary(&report);
    }

    if let Some(database) = &args.sqlite {
        store(&report, database, args.table.as_deref(), &args.fallback_dir)?;
    }

    if args.verbose {
        print_step(3, 3, "Writing output");
        eprintln!("  {} {}\n", "Format:".dimmed(), format!("{:?}", args.format).bright_white());
    }

    let output = render_output(&report, args.format).context("Failed to format records")?;

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None if output.ends_with('\n') => print!("{}", output),
        None => println!("{}", output),
    }

    Ok(())
}
