//! Staleness-gated mirror of remote reference data.
//!
//! This module is service-agnostic. It decides when a local mirror of a
//! paginated remote resource must be refreshed, performs the refresh as an
//! atomic full replace, and records every attempt in an append-only ledger
//! so freshness decisions survive process restarts.

mod ledger;
mod policy;
mod record;
mod store;
mod sync;

pub use ledger::RefreshLedger;
pub use record::{Mirrored, Resource};
pub use store::MirrorStore;
pub use sync::{SyncOrchestrator, SyncOutcome};
