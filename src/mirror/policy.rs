//! Freshness decisions for mirrored resources.

use chrono::{DateTime, Utc};

use super::record::Resource;

/// Whether `resource` must be refreshed at `now`.
///
/// Only successful refreshes anchor the freshness window, so callers pass the
/// time of the last *success*; failed attempts in between are irrelevant
/// here. A mirror that is exactly `max_age` old still counts as fresh.
pub fn needs_refresh(
  resource: &Resource,
  last_success: Option<DateTime<Utc>>,
  now: DateTime<Utc>,
) -> bool {
  match last_success {
    // Never successfully synced.
    None => true,
    Some(at) => now - at > resource.max_age,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn resource(max_age: Duration) -> Resource {
    Resource {
      name: "users",
      max_age,
    }
  }

  #[test]
  fn never_synced_needs_refresh() {
    let r = resource(Duration::days(100));
    assert!(needs_refresh(&r, None, Utc::now()));
  }

  #[test]
  fn fresh_within_window() {
    let r = resource(Duration::days(100));
    let now = Utc::now();
    assert!(!needs_refresh(&r, Some(now - Duration::days(99)), now));
  }

  #[test]
  fn exactly_at_window_is_still_fresh() {
    let r = resource(Duration::days(100));
    let now = Utc::now();
    assert!(!needs_refresh(&r, Some(now - Duration::days(100)), now));
  }

  #[test]
  fn stale_past_window() {
    let r = resource(Duration::days(100));
    let now = Utc::now();
    assert!(needs_refresh(
      &r,
      Some(now - Duration::days(100) - Duration::seconds(1)),
      now
    ));
  }
}
