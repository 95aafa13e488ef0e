//! Serde shapes for the TSheets REST API.
//!
//! Responses wrap their payload in a `results` object keyed by entity type,
//! with entities as an id-keyed map. An empty map marks the last page.

use serde::Deserialize;
use std::collections::HashMap;

use super::types::{Jobcode, User};

#[derive(Debug, Deserialize)]
pub struct UsersResponse {
  pub results: UsersResults,
}

#[derive(Debug, Deserialize)]
pub struct UsersResults {
  #[serde(default)]
  pub users: HashMap<String, ApiUser>,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  pub id: i64,
  pub first_name: String,
  pub last_name: String,
  #[serde(default)]
  pub email: String,
}

impl ApiUser {
  /// Flatten into the mirrored shape, joining first and last name.
  pub fn into_user(self) -> User {
    User {
      id: self.id,
      name: format!("{} {}", self.first_name, self.last_name),
      email: self.email,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct GroupsResponse {
  pub results: GroupsResults,
}

#[derive(Debug, Deserialize)]
pub struct GroupsResults {
  #[serde(default)]
  pub groups: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct JobcodesResponse {
  pub results: JobcodesResults,
}

#[derive(Debug, Deserialize)]
pub struct JobcodesResults {
  #[serde(default)]
  pub jobcodes: HashMap<String, ApiJobcode>,
}

#[derive(Debug, Deserialize)]
pub struct ApiJobcode {
  pub id: i64,
  pub parent_id: i64,
  pub name: String,
}

impl ApiJobcode {
  pub fn into_jobcode(self) -> Jobcode {
    Jobcode {
      id: self.id,
      parent_id: self.parent_id,
      name: self.name,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct TimesheetsResponse {
  pub results: TimesheetsResults,
}

#[derive(Debug, Deserialize)]
pub struct TimesheetsResults {
  #[serde(default)]
  pub timesheets: HashMap<String, ApiTimesheet>,
}

/// One timesheet in a response. Write responses carry a per-timesheet status
/// beside the entity fields.
#[derive(Debug, Deserialize)]
pub struct ApiTimesheet {
  #[serde(rename = "_status_code")]
  pub status_code: Option<u16>,
  #[serde(rename = "_status_message")]
  pub status_message: Option<String>,
}
