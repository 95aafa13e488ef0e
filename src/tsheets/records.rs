//! Mirror wiring for TSheets reference data.

use rusqlite::{params, Row, Statement};

use crate::mirror::Mirrored;

use super::types::{Jobcode, User};

/// Root sentinel the API uses for top-level job codes. Stored as NULL so the
/// parent foreign key holds for every persisted row.
const ROOT_PARENT: i64 = 0;

impl Mirrored for User {
  fn table() -> &'static str {
    "users"
  }

  fn key_column() -> &'static str {
    "user_id"
  }

  fn name_column() -> &'static str {
    "name"
  }

  fn columns() -> &'static str {
    "user_id, name, email"
  }

  fn insert_sql() -> &'static str {
    "INSERT INTO users (user_id, name, email) VALUES (?, ?, ?)"
  }

  fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
    stmt.execute(params![self.id, self.name, self.email])
  }

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id: row.get(0)?,
      name: row.get(1)?,
      email: row.get(2)?,
    })
  }
}

impl Mirrored for Jobcode {
  fn table() -> &'static str {
    "jobcodes"
  }

  fn key_column() -> &'static str {
    "jobcode_id"
  }

  fn name_column() -> &'static str {
    "name"
  }

  fn columns() -> &'static str {
    "jobcode_id, parent_id, name"
  }

  fn insert_sql() -> &'static str {
    "INSERT INTO jobcodes (jobcode_id, parent_id, name) VALUES (?, ?, ?)"
  }

  fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
    let parent = (self.parent_id != ROOT_PARENT).then_some(self.parent_id);
    stmt.execute(params![self.id, parent, self.name])
  }

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    let parent: Option<i64> = row.get(1)?;
    Ok(Self {
      id: row.get(0)?,
      parent_id: parent.unwrap_or(ROOT_PARENT),
      name: row.get(2)?,
    })
  }
}
