//! Sync orchestration: decide, fetch, replace, record.

use chrono::Utc;
use color_eyre::Result;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::ledger::RefreshLedger;
use super::policy;
use super::record::{Mirrored, Resource};
use super::store::MirrorStore;

/// Outcome of one sync pass over a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
  /// The mirror was fresh; nothing was fetched.
  Fresh,
  /// The mirror was replaced with this many records.
  Refreshed(usize),
  /// The fetch or the replace failed; the mirror keeps its prior rows.
  Failed,
}

/// Drives refreshes of mirrored resources.
///
/// Each call is terminal: a fresh resource is left alone, a stale one gets a
/// single fetch-and-replace attempt whose outcome lands in the ledger either
/// way. A failed attempt does not anchor freshness, so the next call retries
/// immediately; there is no backoff.
pub struct SyncOrchestrator {
  store: Arc<MirrorStore>,
  ledger: Arc<RefreshLedger>,
}

impl SyncOrchestrator {
  pub fn new(store: Arc<MirrorStore>, ledger: Arc<RefreshLedger>) -> Self {
    Self { store, ledger }
  }

  /// Refresh `resource` through `fetcher` if its mirror has gone stale.
  ///
  /// Fetch and store errors are recovered into `SyncOutcome::Failed`; only
  /// ledger I/O errors propagate.
  pub async fn sync<T, F, Fut>(&self, resource: &Resource, fetcher: F) -> Result<SyncOutcome>
  where
    T: Mirrored,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
  {
    let now = Utc::now();
    let last_success = self.ledger.last_success(resource.name)?;

    if !policy::needs_refresh(resource, last_success, now) {
      debug!("{} is fresh, skipping refresh", resource.name);
      return Ok(SyncOutcome::Fresh);
    }

    let outcome = match fetcher().await {
      Ok(records) => {
        if self.store.replace_all(&records) {
          info!("refreshed {} with {} records", resource.name, records.len());
          SyncOutcome::Refreshed(records.len())
        } else {
          SyncOutcome::Failed
        }
      }
      Err(e) => {
        warn!("fetch of {} failed: {}", resource.name, e);
        SyncOutcome::Failed
      }
    };

    // Failed attempts are recorded too; only successes anchor freshness.
    self
      .ledger
      .record(resource.name, outcome != SyncOutcome::Failed, now)?;

    Ok(outcome)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::Database;
  use crate::tsheets::types::User;
  use chrono::Duration;
  use color_eyre::eyre::eyre;
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn orchestrator() -> (SyncOrchestrator, Arc<MirrorStore>, Arc<RefreshLedger>) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let store = Arc::new(MirrorStore::new(Arc::clone(&db)));
    let ledger = Arc::new(RefreshLedger::new(db));
    let sync = SyncOrchestrator::new(Arc::clone(&store), Arc::clone(&ledger));
    (sync, store, ledger)
  }

  fn users_resource() -> Resource {
    Resource {
      name: "users",
      max_age: Duration::days(100),
    }
  }

  fn sample_users() -> Vec<User> {
    vec![
      User {
        id: 1,
        name: "Alice".to_string(),
        email: "a@x.com".to_string(),
      },
      User {
        id: 2,
        name: "Bob".to_string(),
        email: "b@x.com".to_string(),
      },
    ]
  }

  #[tokio::test]
  async fn second_sync_within_window_is_a_no_op() {
    let (sync, store, _) = orchestrator();
    let resource = users_resource();
    let fetches = AtomicUsize::new(0);

    let outcome = sync
      .sync(&resource, || {
        fetches.fetch_add(1, Ordering::SeqCst);
        async { Ok(sample_users()) }
      })
      .await
      .unwrap();
    assert_eq!(outcome, SyncOutcome::Refreshed(2));

    let outcome = sync
      .sync(&resource, || {
        fetches.fetch_add(1, Ordering::SeqCst);
        async { Ok(sample_users()) }
      })
      .await
      .unwrap();
    assert_eq!(outcome, SyncOutcome::Fresh);

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(store.scan::<User>().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn failed_fetch_is_recorded_and_retried() {
    let (sync, store, ledger) = orchestrator();
    let resource = users_resource();

    let outcome = sync
      .sync(&resource, || async {
        Err::<Vec<User>, _>(eyre!("upstream unreachable"))
      })
      .await
      .unwrap();
    assert_eq!(outcome, SyncOutcome::Failed);

    // The failure is in the ledger but does not anchor freshness.
    assert_eq!(ledger.last_success("users").unwrap(), None);
    assert!(store.scan::<User>().unwrap().is_empty());

    // The very next call retries and a success closes the window.
    let outcome = sync
      .sync(&resource, || async { Ok(sample_users()) })
      .await
      .unwrap();
    assert_eq!(outcome, SyncOutcome::Refreshed(2));
    assert!(ledger.last_success("users").unwrap().is_some());

    // And an immediate re-sync is a no-op again.
    let outcome = sync
      .sync(&resource, || async { Ok(sample_users()) })
      .await
      .unwrap();
    assert_eq!(outcome, SyncOutcome::Fresh);
  }

  #[tokio::test]
  async fn failed_replace_keeps_prior_mirror_and_stays_stale() {
    let (sync, store, ledger) = orchestrator();
    let resource = users_resource();

    // A mirror whose last success is long past the window.
    assert!(store.replace_all(&sample_users()));
    ledger
      .record("users", true, Utc::now() - Duration::days(200))
      .unwrap();

    // A duplicate-key payload makes the replace fail; the old rows survive.
    let dup = vec![
      User {
        id: 9,
        name: "Carol".to_string(),
        email: "c@x.com".to_string(),
      },
      User {
        id: 9,
        name: "Dave".to_string(),
        email: "d@x.com".to_string(),
      },
    ];
    let outcome = sync.sync(&resource, || async { Ok(dup) }).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Failed);

    // Prior rows survive and the failure did not move the freshness anchor.
    assert_eq!(store.scan::<User>().unwrap().len(), 2);
    let last = ledger.last_success("users").unwrap().unwrap();
    assert!(Utc::now() - last > resource.max_age);
  }
}
