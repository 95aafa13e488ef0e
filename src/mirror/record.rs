//! Core trait and resource descriptor for the mirror.

use chrono::Duration;
use rusqlite::{Row, Statement};

/// A named mirrored dataset and how stale its local copy may grow.
#[derive(Debug, Clone, Copy)]
pub struct Resource {
  /// Mirror table name, also the ledger key.
  pub name: &'static str,
  /// Maximum age of the last successful refresh before a new one is needed.
  pub max_age: Duration,
}

/// Trait for records mirrored from the remote service into a local table.
///
/// Implementors describe their table shape so the store can replace, look up
/// and scan them without knowing which resource it is handling.
pub trait Mirrored: Clone + Send {
  /// Mirror table name (e.g. "users").
  fn table() -> &'static str;

  /// Primary key column name.
  fn key_column() -> &'static str;

  /// Column matched by name lookups.
  fn name_column() -> &'static str;

  /// Column list for SELECTs, in `from_row` order.
  fn columns() -> &'static str;

  /// INSERT statement covering `columns()` in the same order.
  fn insert_sql() -> &'static str;

  /// Bind this record to the prepared `insert_sql` statement and execute it.
  fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize>;

  /// Read one record from a row of `columns()`.
  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}
