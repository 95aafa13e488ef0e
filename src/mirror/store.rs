//! Durable keyed mirror tables with atomic full replace.

use color_eyre::{eyre::eyre, Result};
use rusqlite::params;
use std::sync::Arc;
use tracing::warn;

use crate::db::Database;

use super::record::Mirrored;

/// Durable store for mirrored resources.
///
/// Writes go through `replace_all`, which substitutes a resource's entire row
/// set inside one transaction. Reads are point lookups and full scans; scan
/// order is unspecified.
pub struct MirrorStore {
  db: Arc<Database>,
}

impl MirrorStore {
  pub fn new(db: Arc<Database>) -> Self {
    Self { db }
  }

  /// Replace every row of `T`'s table with `records`, atomically.
  ///
  /// On any constraint violation or I/O error the transaction rolls back,
  /// the prior rows stay visible, and the outcome is reported as `false` so
  /// the orchestrator can record it without aborting.
  pub fn replace_all<T: Mirrored>(&self, records: &[T]) -> bool {
    match self.try_replace_all(records) {
      Ok(()) => true,
      Err(e) => {
        warn!("replace of {} failed: {}", T::table(), e);
        false
      }
    }
  }

  fn try_replace_all<T: Mirrored>(&self, records: &[T]) -> Result<()> {
    let mut conn = self.db.lock()?;

    // Rolls back on drop unless committed.
    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    tx.execute(&format!("DELETE FROM {}", T::table()), [])
      .map_err(|e| eyre!("Failed to clear {}: {}", T::table(), e))?;

    {
      let mut stmt = tx
        .prepare(T::insert_sql())
        .map_err(|e| eyre!("Failed to prepare insert for {}: {}", T::table(), e))?;

      for record in records {
        record
          .insert(&mut stmt)
          .map_err(|e| eyre!("Failed to insert into {}: {}", T::table(), e))?;
      }
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit replace of {}: {}", T::table(), e))?;

    Ok(())
  }

  /// Look up one record by primary key.
  pub fn get<T: Mirrored>(&self, key: i64) -> Result<Option<T>> {
    let conn = self.db.lock()?;

    let sql = format!(
      "SELECT {} FROM {} WHERE {} = ? LIMIT 1",
      T::columns(),
      T::table(),
      T::key_column()
    );
    let mut stmt = conn
      .prepare(&sql)
      .map_err(|e| eyre!("Failed to prepare lookup for {}: {}", T::table(), e))?;

    match stmt.query_row(params![key], |row| T::from_row(row)) {
      Ok(record) => Ok(Some(record)),
      Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
      Err(e) => Err(eyre!("Failed to look up {} {}: {}", T::table(), key, e)),
    }
  }

  /// Resolve a name to a primary key.
  ///
  /// Names are not unique upstream; on duplicates the lowest primary key
  /// wins, deterministically.
  pub fn key_by_name<T: Mirrored>(&self, name: &str) -> Result<Option<i64>> {
    let conn = self.db.lock()?;

    let sql = format!(
      "SELECT {} FROM {} WHERE {} = ? ORDER BY {} LIMIT 1",
      T::key_column(),
      T::table(),
      T::name_column(),
      T::key_column()
    );
    let mut stmt = conn
      .prepare(&sql)
      .map_err(|e| eyre!("Failed to prepare name lookup for {}: {}", T::table(), e))?;

    match stmt.query_row(params![name], |row| row.get(0)) {
      Ok(key) => Ok(Some(key)),
      Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
      Err(e) => Err(eyre!("Failed to resolve {} '{}': {}", T::table(), name, e)),
    }
  }

  /// All rows of `T`'s table.
  pub fn scan<T: Mirrored>(&self) -> Result<Vec<T>> {
    let conn = self.db.lock()?;

    let sql = format!("SELECT {} FROM {}", T::columns(), T::table());
    let mut stmt = conn
      .prepare(&sql)
      .map_err(|e| eyre!("Failed to prepare scan of {}: {}", T::table(), e))?;

    let records = stmt
      .query_map([], |row| T::from_row(row))
      .map_err(|e| eyre!("Failed to scan {}: {}", T::table(), e))?
      .collect::<rusqlite::Result<Vec<T>>>()
      .map_err(|e| eyre!("Failed to read {} row: {}", T::table(), e))?;

    Ok(records)
  }

  /// All names in `T`'s table.
  pub fn names<T: Mirrored>(&self) -> Result<Vec<String>> {
    let conn = self.db.lock()?;

    let sql = format!("SELECT {} FROM {}", T::name_column(), T::table());
    let mut stmt = conn
      .prepare(&sql)
      .map_err(|e| eyre!("Failed to prepare name scan of {}: {}", T::table(), e))?;

    let names = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to scan {} names: {}", T::table(), e))?
      .collect::<rusqlite::Result<Vec<String>>>()
      .map_err(|e| eyre!("Failed to read {} name: {}", T::table(), e))?;

    Ok(names)
  }

  /// Resolve primary keys to names, preserving input order.
  ///
  /// Keys with no mirrored row yield `None`.
  pub fn names_by_keys<T: Mirrored>(&self, keys: &[i64]) -> Result<Vec<Option<String>>> {
    let conn = self.db.lock()?;

    let sql = format!(
      "SELECT {} FROM {} WHERE {} = ? LIMIT 1",
      T::name_column(),
      T::table(),
      T::key_column()
    );
    let mut stmt = conn
      .prepare(&sql)
      .map_err(|e| eyre!("Failed to prepare name lookup for {}: {}", T::table(), e))?;

    let mut names = Vec::with_capacity(keys.len());
    for key in keys {
      match stmt.query_row(params![key], |row| row.get(0)) {
        Ok(name) => names.push(Some(name)),
        Err(rusqlite::Error::QueryReturnedNoRows) => names.push(None),
        Err(e) => return Err(eyre!("Failed to resolve {} {}: {}", T::table(), key, e)),
      }
    }

    Ok(names)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tsheets::types::{Jobcode, User};

  fn store() -> MirrorStore {
    MirrorStore::new(Arc::new(Database::open_in_memory().unwrap()))
  }

  fn alice() -> User {
    User {
      id: 1,
      name: "Alice".to_string(),
      email: "a@x.com".to_string(),
    }
  }

  fn bob() -> User {
    User {
      id: 2,
      name: "Bob".to_string(),
      email: "b@x.com".to_string(),
    }
  }

  #[test]
  fn users_round_trip() {
    let store = store();
    assert!(store.replace_all(&[alice(), bob()]));

    assert_eq!(store.key_by_name::<User>("Alice").unwrap(), Some(1));
    assert_eq!(store.get::<User>(1).unwrap(), Some(alice()));
    assert_eq!(store.get::<User>(3).unwrap(), None);
    assert_eq!(store.key_by_name::<User>("Carol").unwrap(), None);
  }

  #[test]
  fn replace_drops_prior_rows() {
    let store = store();
    assert!(store.replace_all(&[alice(), bob()]));
    assert!(store.replace_all(&[alice()]));

    assert_eq!(store.scan::<User>().unwrap().len(), 1);
    assert_eq!(store.get::<User>(2).unwrap(), None);
  }

  #[test]
  fn failed_replace_leaves_prior_rows_intact() {
    let store = store();
    assert!(store.replace_all(&[alice(), bob()]));

    // Duplicate primary key violates the constraint mid-insert.
    let dup = vec![
      User {
        id: 3,
        name: "Carol".to_string(),
        email: "c@x.com".to_string(),
      },
      User {
        id: 3,
        name: "Dave".to_string(),
        email: "d@x.com".to_string(),
      },
    ];
    assert!(!store.replace_all(&dup));

    let mut names = store.names::<User>().unwrap();
    names.sort();
    assert_eq!(names, vec!["Alice".to_string(), "Bob".to_string()]);
  }

  #[test]
  fn duplicate_names_resolve_to_lowest_key() {
    let store = store();
    let twin = User {
      id: 5,
      name: "Alice".to_string(),
      email: "a2@x.com".to_string(),
    };
    assert!(store.replace_all(&[twin, alice()]));

    assert_eq!(store.key_by_name::<User>("Alice").unwrap(), Some(1));
  }

  #[test]
  fn jobcode_tree_round_trip() {
    let store = store();
    let jobs = vec![
      Jobcode {
        id: 10,
        parent_id: 0,
        name: "Programming".to_string(),
      },
      Jobcode {
        id: 11,
        parent_id: 10,
        name: "Backend".to_string(),
      },
    ];
    assert!(store.replace_all(&jobs));

    let mut names = store.names::<Jobcode>().unwrap();
    names.sort();
    assert_eq!(names, vec!["Backend".to_string(), "Programming".to_string()]);
    assert_eq!(store.key_by_name::<Jobcode>("Programming").unwrap(), Some(10));

    // The root sentinel survives the NULL mapping.
    assert_eq!(store.get::<Jobcode>(10).unwrap().unwrap().parent_id, 0);
    assert_eq!(store.get::<Jobcode>(11).unwrap().unwrap().parent_id, 10);
  }

  #[test]
  fn child_insert_order_does_not_matter() {
    let store = store();
    // Child listed before its parent; the deferred FK checks at commit.
    let jobs = vec![
      Jobcode {
        id: 11,
        parent_id: 10,
        name: "Backend".to_string(),
      },
      Jobcode {
        id: 10,
        parent_id: 0,
        name: "Programming".to_string(),
      },
    ];
    assert!(store.replace_all(&jobs));
  }

  #[test]
  fn dangling_parent_rejects_the_whole_set() {
    let store = store();
    let good = vec![Jobcode {
      id: 10,
      parent_id: 0,
      name: "Programming".to_string(),
    }];
    assert!(store.replace_all(&good));

    let dangling = vec![Jobcode {
      id: 11,
      parent_id: 99,
      name: "Backend".to_string(),
    }];
    assert!(!store.replace_all(&dangling));

    assert_eq!(store.names::<Jobcode>().unwrap(), vec!["Programming".to_string()]);
  }

  #[test]
  fn names_by_keys_preserves_order_and_marks_absent() {
    let store = store();
    assert!(store.replace_all(&[alice(), bob()]));

    let names = store.names_by_keys::<User>(&[2, 7, 1]).unwrap();
    assert_eq!(
      names,
      vec![Some("Bob".to_string()), None, Some("Alice".to_string())]
    );
  }
}
