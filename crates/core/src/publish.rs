//! Handing a finished scrape to a data sink, with a local fallback.
//!
//! Every non-empty partition is inserted into the category's table. If the
//! sink rejects any batch, the whole report is written as JSON keyed by
//! period into a fallback directory instead, and the run still counts as a
//! success.

use std::fs;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::{RankwatchError, Result};
use crate::formatters::partitions_to_value;
use crate::scrape::ScrapeReport;
use crate::sink::{DataSink, Record};

const EXPORT_STAMP: &[BorrowedFormatItem<'_>] = format_description!("[year][month][day]_[hour][minute][second]");

/// Where the records of a report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// All records were accepted by the sink.
    Stored { rows: usize },
    /// The sink failed; records were written to this file.
    Exported(PathBuf),
    /// The report held no records.
    Empty,
}

/// Inserts each partition of `report` into the category's table, exporting to
/// `fallback_dir` on failure.
///
/// Only the fallback export itself can fail this call.
pub fn publish(report: &ScrapeReport, sink: &mut dyn DataSink, fallback_dir: &Path) -> Result<PublishOutcome> {
    publish_to(report, sink, report.category.table_name(), fallback_dir)
}

/// [`publish`] into an explicitly named table.
pub fn publish_to(
    report: &ScrapeReport, sink: &mut dyn DataSink, table: &str, fallback_dir: &Path,
) -> Result<PublishOutcome> {
    if report.is_empty() {
        tracing::warn!(category = %report.category, "nothing to publish");
        return Ok(PublishOutcome::Empty);
    }

    let mut rows = 0;

    for partition in report.partitions.iter().filter(|p| !p.entities.is_empty()) {
        let records: Vec<Record> = partition.entities.iter().map(|e| e.to_record()).collect();
        match sink.insert(table, &records) {
            Ok(()) => {
                tracing::info!(table, period = %partition.time_period, rows = records.len(), "stored partition");
                rows += records.len();
            }
            Err(e) => {
                tracing::warn!(table, period = %partition.time_period, error = %e, "sink failed, exporting locally");
                let path = export_structured(report, fallback_dir, OffsetDateTime::now_utc())?;
                return Ok(PublishOutcome::Exported(path));
            }
        }
    }

    Ok(PublishOutcome::Stored { rows })
}

/// Writes `{time_period: [records]}` to a timestamped file in `dir`.
pub fn export_structured(report: &ScrapeReport, dir: &Path, at: OffsetDateTime) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let stamp = at.format(EXPORT_STAMP).map_err(|e| RankwatchError::Export(e.to_string()))?;
    let path = dir.join(format!("{}_structured_{}.json", report.category.table_name(), stamp));

    let json = serde_json::to_string_pretty(&partitions_to_value(report))?;
    fs::write(&path, json)?;

    tracing::info!(path = %path.display(), "exported records");
    Ok(path)
}
