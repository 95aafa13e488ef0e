use chrono::Duration;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Days before a mirrored resource goes stale, unless overridden.
const DEFAULT_MAX_AGE_DAYS: i64 = 100;

const DEFAULT_API_URL: &str = "https://rest.tsheets.com/api/v1";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  pub tsheets: TSheetsConfig,
  /// Path of the mirror database (defaults to the platform data dir).
  pub database: Option<PathBuf>,
  /// Days before a mirrored resource goes stale.
  pub max_age_days: i64,
  /// Per-resource overrides of `max_age_days`, keyed by resource name.
  pub max_age_overrides: HashMap<String, i64>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      tsheets: TSheetsConfig::default(),
      database: None,
      max_age_days: DEFAULT_MAX_AGE_DAYS,
      max_age_overrides: HashMap::new(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TSheetsConfig {
  /// API base URL.
  pub url: String,
  /// Group names whose members are mirrored. Empty mirrors everyone.
  pub groups: Vec<String>,
}

impl Default for TSheetsConfig {
  fn default() -> Self {
    Self {
      url: DEFAULT_API_URL.to_string(),
      groups: vec!["Students".to_string()],
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./punch.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/punch/config.yaml
  ///
  /// Every setting has a default, so a missing file yields the defaults;
  /// only an explicit path that does not exist is an error.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("punch.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("punch").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the TSheets API token from environment variables.
  ///
  /// Checks PUNCH_TSHEETS_TOKEN first, then TSHEETS_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("PUNCH_TSHEETS_TOKEN")
      .or_else(|_| std::env::var("TSHEETS_TOKEN"))
      .map_err(|_| {
        eyre!(
          "TSheets API token not found. Set PUNCH_TSHEETS_TOKEN or TSHEETS_TOKEN environment variable."
        )
      })
  }

  /// Maximum mirror age for `resource`.
  pub fn max_age(&self, resource: &str) -> Duration {
    let days = self
      .max_age_overrides
      .get(resource)
      .copied()
      .unwrap_or(self.max_age_days);

    Duration::days(days)
  }
}
