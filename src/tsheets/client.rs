use chrono::{Duration, Local, SecondsFormat, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::Config;

use super::api_types::{GroupsResponse, JobcodesResponse, TimesheetsResponse, UsersResponse};
use super::types::{Jobcode, User};

/// TSheets REST API client.
#[derive(Clone)]
pub struct TSheetsClient {
  http: reqwest::Client,
  base_url: String,
  token: String,
  group_names: Vec<String>,
}

impl TSheetsClient {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::get_api_token()?;

    Ok(Self {
      http: reqwest::Client::new(),
      base_url: config.tsheets.url.trim_end_matches('/').to_string(),
      token,
      group_names: config.tsheets.groups.clone(),
    })
  }

  async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T> {
    let url = format!("{}/{}", self.base_url, endpoint);

    let response = self
      .http
      .get(&url)
      .bearer_auth(&self.token)
      .query(query)
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", endpoint, e))?
      .error_for_status()
      .map_err(|e| eyre!("Request to {} rejected: {}", endpoint, e))?;

    response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse {} response: {}", endpoint, e))
  }

  /// Resolve the configured group names to group ids.
  async fn get_group_ids(&self) -> Result<Vec<String>> {
    let query = [
      ("names", self.group_names.join(",")),
      ("supplemental_data", "no".to_string()),
    ];

    let response: GroupsResponse = self.get("groups", &query).await?;

    let mut ids: Vec<String> = response.results.groups.into_keys().collect();
    ids.sort();
    Ok(ids)
  }

  /// Fetch every user in the configured groups, paging until an empty page.
  pub async fn fetch_users(&self) -> Result<Vec<User>> {
    let group_ids = if self.group_names.is_empty() {
      None
    } else {
      Some(self.get_group_ids().await?.join(","))
    };

    let mut users = Vec::new();
    let mut page = 1u32;

    loop {
      let mut query = vec![
        ("supplemental_data", "no".to_string()),
        ("page", page.to_string()),
      ];
      if let Some(ids) = &group_ids {
        query.push(("group_ids", ids.clone()));
      }

      let response: UsersResponse = self.get("users", &query).await?;
      if response.results.users.is_empty() {
        break;
      }

      users.extend(response.results.users.into_values().map(|u| u.into_user()));
      page += 1;
    }

    Ok(users)
  }

  /// Fetch the full job code tree, paging until an empty page.
  pub async fn fetch_jobcodes(&self) -> Result<Vec<Jobcode>> {
    let mut jobcodes = Vec::new();
    let mut page = 1u32;

    loop {
      let query = [
        ("supplemental_data", "no".to_string()),
        ("page", page.to_string()),
      ];

      let response: JobcodesResponse = self.get("jobcodes", &query).await?;
      if response.results.jobcodes.is_empty() {
        break;
      }

      jobcodes.extend(
        response
          .results
          .jobcodes
          .into_values()
          .map(|j| j.into_jobcode()),
      );
      page += 1;
    }

    Ok(jobcodes)
  }

  /// Start a regular, open-ended timesheet for `user_id` on `jobcode_id`.
  pub async fn clock_in(&self, user_id: i64, jobcode_id: i64) -> Result<()> {
    let body = json!({
      "data": [{
        "user_id": user_id,
        "jobcode_id": jobcode_id,
        "type": "regular",
        "start": current_time(),
        "end": "",
      }]
    });

    let url = format!("{}/timesheets", self.base_url);
    let response = self
      .http
      .post(&url)
      .bearer_auth(&self.token)
      .json(&body)
      .send()
      .await
      .map_err(|e| eyre!("Clock-in request failed: {}", e))?
      .error_for_status()
      .map_err(|e| eyre!("Clock-in request rejected: {}", e))?;

    let response: TimesheetsResponse = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse clock-in response: {}", e))?;

    // The HTTP status can be 200 while individual timesheets fail.
    for (key, sheet) in &response.results.timesheets {
      if let Some(code) = sheet.status_code {
        if code >= 400 {
          return Err(eyre!(
            "Clock-in rejected for timesheet {}: {} ({})",
            key,
            sheet.status_message.as_deref().unwrap_or("unknown error"),
            code
          ));
        }
      }
    }

    Ok(())
  }

  /// Which of `user_ids` currently have an open timesheet.
  ///
  /// One probe request per user; the API only filters on-the-clock
  /// timesheets per user id.
  pub async fn clocked_in_users(&self, user_ids: &[i64]) -> Result<Vec<i64>> {
    let start_date = (Utc::now() - Duration::weeks(52))
      .format("%Y-%m-%d")
      .to_string();

    let mut clocked_in = Vec::new();

    for &user_id in user_ids {
      let query = [
        ("user_ids", user_id.to_string()),
        ("supplemental_data", "no".to_string()),
        ("on_the_clock", "yes".to_string()),
        ("per_page", "1".to_string()),
        ("start_date", start_date.clone()),
      ];

      let response: TimesheetsResponse = self.get("timesheets", &query).await?;
      if !response.results.timesheets.is_empty() {
        clocked_in.push(user_id);
      }
    }

    Ok(clocked_in)
  }
}

/// Current local time with offset, second precision, ISO 8601.
fn current_time() -> String {
  Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}
