use std::io::Write;

use serde_json::Value;

use crate::entity::{RECORD_FIELDS, RankedEntity};
use crate::scrape::ScrapeReport;
use crate::{RankwatchError, Result};

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write>(w: &mut W, row: &[String]) -> std::io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, ",")?;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    write!(w, "\r\n")
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Writes a header row plus one row per entity, columns in record field order.
pub fn write_csv<'a, W: Write>(mut w: W, entities: impl IntoIterator<Item = &'a RankedEntity>) -> Result<()> {
    let header: Vec<String> = RECORD_FIELDS.iter().map(|f| f.to_string()).collect();
    write_row(&mut w, &header)?;

    for entity in entities {
        let record = entity.to_record();
        let row: Vec<String> = RECORD_FIELDS.iter().map(|f| cell(record.get(*f))).collect();
        write_row(&mut w, &row)?;
    }
    Ok(())
}

/// Convert every entity of a report to CSV
pub fn convert_to_csv(report: &ScrapeReport) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, report.all_entities())?;
    String::from_utf8(buffer).map_err(|e| RankwatchError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Category;
    use crate::scrape::PeriodResult;

    fn app(rank: u32, name: &str, description: &str) -> RankedEntity {
        RankedEntity {
            rank,
            name: name.to_string(),
            secondary_label: Some(description.to_string()),
            usage_metric: "1.2Btokens".to_string(),
            is_new: rank == 2,
            trend: None,
            target_url: "https://cline.bot/".to_string(),
            domain: "cline.bot".to_string(),
            icon_url: String::new(),
            owner_url: String::new(),
            category: Category::App,
            time_period: "Today".to_string(),
            scraped_at: "2025-06-01T12:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_header_follows_record_fields() {
        let csv = convert_to_csv(&ScrapeReport::new(Category::App)).unwrap();
        assert_eq!(csv, format!("{}\r\n", RECORD_FIELDS.join(",")));
    }

    #[test]
    fn test_rows_and_quoting() {
        let mut report = ScrapeReport::new(Category::App);
        report.partitions.push(PeriodResult {
            time_period: "Today".to_string(),
            entities: vec![app(1, "Cline", "Autonomous coding agent"), app(2, "Roo, Code", "The \"fast\" one")],
            strategy: None,
            error: None,
        });

        let csv = convert_to_csv(&report).unwrap();
        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("1,Cline,Autonomous coding agent,1.2Btokens,false,,,,,,https://cline.bot/"));
        assert!(lines[2].starts_with(r#"2,"Roo, Code","The ""fast"" one",1.2Btokens,true"#));
        assert!(lines[2].ends_with(",app,Today,2025-06-01T12:00:00Z"));
    }

    #[test]
    fn test_cell_rendering() {
        assert_eq!(cell(None), "");
        assert_eq!(cell(Some(&Value::Null)), "");
        assert_eq!(cell(Some(&Value::from(7))), "7");
        assert_eq!(cell(Some(&Value::from("x"))), "x");
    }
}
