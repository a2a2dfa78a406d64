//! Persistence targets for scraped records.
//!
//! A [`DataSink`] accepts flat record mappings (see
//! [`RankedEntity::to_record`](crate::RankedEntity::to_record)) for a named
//! table. Rejection is an ordinary error: the publisher falls back to a local
//! export instead of failing the run.

use serde_json::{Map, Value};

use crate::{RankwatchError, Result};

/// One flat record as handed to a sink.
pub type Record = Map<String, Value>;

/// Destination for scraped records.
pub trait DataSink {
    /// Stores `records` in `table`. Either every record is stored or an error is returned.
    fn insert(&mut self, table: &str, records: &[Record]) -> Result<()>;
}

/// In-process sink that keeps every accepted batch.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Vec<(String, Vec<Record>)>,
    reject: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that refuses every insert with `reason`.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self { batches: Vec::new(), reject: Some(reason.into()) }
    }

    pub fn batches(&self) -> &[(String, Vec<Record>)] {
        &self.batches
    }

    /// Records stored in `table` across all batches.
    pub fn records(&self, table: &str) -> Vec<&Record> {
        self.batches
            .iter()
            .filter(|(name, _)| name == table)
            .flat_map(|(_, records)| records.iter())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.batches.iter().map(|(_, records)| records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DataSink for MemorySink {
    fn insert(&mut self, table: &str, records: &[Record]) -> Result<()> {
        if let Some(reason) = &self.reject {
            return Err(RankwatchError::Sink(reason.clone()));
        }
        self.batches.push((table.to_string(), records.to_vec()));
        Ok(())
    }
}

/// Table names must be plain identifiers; they are interpolated into SQL.
pub fn validate_table_name(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(RankwatchError::Sink(format!("invalid table name: '{}'", table)))
    }
}

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSink;

#[cfg(feature = "sqlite")]
mod sqlite {
    use std::path::Path;

    use rusqlite::{Connection, params};

    use super::{DataSink, Record, validate_table_name};
    use crate::Result;

    /// Sink writing one row per record into a SQLite database.
    ///
    /// Each table is created on first use with the rank and period pulled
    /// out into indexed columns and the full record kept as JSON.
    #[derive(Debug)]
    pub struct SqliteSink {
        conn: Connection,
    }

    impl SqliteSink {
        pub fn open(path: impl AsRef<Path>) -> Result<Self> {
            let conn = Connection::open(path)?;
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
            Ok(Self { conn })
        }

        pub fn in_memory() -> Result<Self> {
            Ok(Self { conn: Connection::open_in_memory()? })
        }

        fn ensure_table(&self, table: &str) -> Result<()> {
            validate_table_name(table)?;
            self.conn.execute_batch(&format!(
                "
                CREATE TABLE IF NOT EXISTS {table} (
                    id          INTEGER PRIMARY KEY,
                    category    TEXT NOT NULL,
                    time_period TEXT NOT NULL,
                    rank        INTEGER NOT NULL,
                    name        TEXT NOT NULL,
                    record      TEXT NOT NULL,
                    inserted_at TEXT NOT NULL DEFAULT (datetime('now'))
                );
                CREATE INDEX IF NOT EXISTS idx_{table}_period_rank ON {table}(time_period, rank);
                "
            ))?;
            Ok(())
        }

        /// Rows stored in `table`.
        pub fn count(&self, table: &str) -> Result<usize> {
            validate_table_name(table)?;
            let count: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(count as usize)
        }

        /// Stored records of `table` for one period, in rank order.
        pub fn records(&self, table: &str, time_period: &str) -> Result<Vec<Record>> {
            validate_table_name(table)?;
            let mut stmt = self
                .conn
                .prepare(&format!("SELECT record FROM {table} WHERE time_period = ?1 ORDER BY rank"))?;
            let rows = stmt.query_map(params![time_period], |row| row.get::<_, String>(0))?;

            let mut records = Vec::new();
            for row in rows {
                records.push(serde_json::from_str(&row?)?);
            }
            Ok(records)
        }
    }

    impl DataSink for SqliteSink {
        fn insert(&mut self, table: &str, records: &[Record]) -> Result<()> {
            self.ensure_table(table)?;

            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare(&format!(
                    "INSERT INTO {table} (category, time_period, rank, name, record) VALUES (?1, ?2, ?3, ?4, ?5)"
                ))?;
                for record in records {
                    let text = |key: &str| record.get(key).and_then(|v| v.as_str()).unwrap_or_default().to_string();
                    let rank = record.get("rank").and_then(|v| v.as_i64()).unwrap_or_default();
                    stmt.execute(params![
                        text("category"),
                        text("time_period"),
                        rank,
                        text("name"),
                        serde_json::to_string(record)?,
                    ])?;
                }
            }
            tx.commit()?;

            tracing::debug!(table, rows = records.len(), "inserted records");
            Ok(())
        }
    }
}
