//! Application wiring and the business actions built on the mirror.

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::db::Database;
use crate::mirror::{MirrorStore, Mirrored, RefreshLedger, Resource, SyncOrchestrator};
use crate::tsheets::client::TSheetsClient;
use crate::tsheets::types::{Jobcode, User};

/// The wired-up application: live API client plus the local mirror.
pub struct App {
  client: TSheetsClient,
  store: Arc<MirrorStore>,
  sync: SyncOrchestrator,
  users: Resource,
  jobcodes: Resource,
}

impl App {
  pub fn new(config: &Config) -> Result<Self> {
    let client = TSheetsClient::new(config)?;

    let db = Arc::new(Database::open(config.database.as_deref())?);
    let store = Arc::new(MirrorStore::new(Arc::clone(&db)));
    let ledger = Arc::new(RefreshLedger::new(db));
    let sync = SyncOrchestrator::new(Arc::clone(&store), ledger);

    Ok(Self {
      client,
      store,
      sync,
      users: Resource {
        name: User::table(),
        max_age: config.max_age(User::table()),
      },
      jobcodes: Resource {
        name: Jobcode::table(),
        max_age: config.max_age(Jobcode::table()),
      },
    })
  }

  /// Bring both mirrored resources up to date if stale.
  ///
  /// A failed refresh is logged and recorded but does not block use of the
  /// previously mirrored data.
  pub async fn sync_all(&self) -> Result<()> {
    let client = self.client.clone();
    self
      .sync
      .sync(&self.users, || async move { client.fetch_users().await })
      .await?;

    let client = self.client.clone();
    self
      .sync
      .sync(&self.jobcodes, || async move { client.fetch_jobcodes().await })
      .await?;

    Ok(())
  }

  /// All mirrored user names.
  pub fn user_names(&self) -> Result<Vec<String>> {
    self.store.names::<User>()
  }

  /// All mirrored job code names.
  pub fn job_names(&self) -> Result<Vec<String>> {
    self.store.names::<Jobcode>()
  }

  /// Clock `user` in on `job`, resolving both names through the mirror.
  pub async fn clock_in(&self, user: &str, job: &str) -> Result<()> {
    self.sync_all().await?;

    let user_id = self
      .store
      .key_by_name::<User>(user)?
      .ok_or_else(|| eyre!("The user name {} does not exist.", user))?;

    let jobcode_id = self
      .store
      .key_by_name::<Jobcode>(job)?
      .ok_or_else(|| eyre!("The job {} does not exist.", job))?;

    debug!("clocking in user {} on jobcode {}", user_id, jobcode_id);
    self.client.clock_in(user_id, jobcode_id).await
  }

  /// Names of everyone currently on the clock.
  pub async fn whos_in(&self) -> Result<Vec<String>> {
    self.sync_all().await?;

    let user_ids: Vec<i64> = self
      .store
      .scan::<User>()?
      .into_iter()
      .map(|u| u.id)
      .collect();

    let clocked_in = self.client.clocked_in_users(&user_ids).await?;
    let names = self.store.names_by_keys::<User>(&clocked_in)?;

    Ok(
      clocked_in
        .iter()
        .zip(names)
        .map(|(id, name)| name.unwrap_or_else(|| format!("user {}", id)))
        .collect(),
    )
  }
}
