//! Append-only log of refresh attempts.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::params;
use std::sync::Arc;

use crate::db::Database;

/// Append-only record of refresh outcomes, one row per attempt.
///
/// Entries are never updated or deleted; freshness decisions read only the
/// most recent successful entry.
pub struct RefreshLedger {
  db: Arc<Database>,
}

impl RefreshLedger {
  pub fn new(db: Arc<Database>) -> Self {
    Self { db }
  }

  /// Append one refresh outcome for `resource`.
  pub fn record(&self, resource: &str, success: bool, at: DateTime<Utc>) -> Result<()> {
    let conn = self.db.lock()?;

    conn
      .execute(
        "INSERT INTO info_timestamp (table_name, time_stamp, successful) VALUES (?, ?, ?)",
        params![resource, at.to_rfc3339(), success],
      )
      .map_err(|e| eyre!("Failed to append ledger entry for {}: {}", resource, e))?;

    Ok(())
  }

  /// Time of the most recent successful refresh of `resource`, if any.
  ///
  /// Entries with equal timestamps resolve by arrival order.
  pub fn last_success(&self, resource: &str) -> Result<Option<DateTime<Utc>>> {
    let conn = self.db.lock()?;

    let mut stmt = conn
      .prepare(
        "SELECT time_stamp FROM info_timestamp
         WHERE table_name = ? AND successful
         ORDER BY time_stamp DESC, rowid DESC LIMIT 1",
      )
      .map_err(|e| eyre!("Failed to prepare ledger query: {}", e))?;

    match stmt.query_row(params![resource], |row| row.get::<_, String>(0)) {
      Ok(raw) => Ok(Some(parse_timestamp(&raw)?)),
      Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
      Err(e) => Err(eyre!("Failed to read ledger for {}: {}", resource, e)),
    }
  }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| eyre!("Failed to parse ledger timestamp '{}': {}", s, e))
}
