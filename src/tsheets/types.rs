/// A mirrored TSheets user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
  pub id: i64,
  /// Display name, "first last" as joined from the API.
  pub name: String,
  pub email: String,
}

/// A mirrored TSheets job code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jobcode {
  pub id: i64,
  /// Id of the parent job code, or 0 for roots.
  pub parent_id: i64,
  pub name: String,
}
