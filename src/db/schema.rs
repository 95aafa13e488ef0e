//! SQL schema for the mirror database.

/// Mirror tables plus the refresh ledger, created lazily on first open.
///
/// The jobcodes parent foreign key is deferred so a full replacement set is
/// checked as one unit at commit, whatever order the rows arrive in.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER NOT NULL PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS jobcodes (
    jobcode_id INTEGER NOT NULL PRIMARY KEY,
    parent_id INTEGER,
    name TEXT NOT NULL,
    FOREIGN KEY (parent_id)
        REFERENCES jobcodes (jobcode_id)
        DEFERRABLE INITIALLY DEFERRED
);

-- Refresh ledger: append-only, one row per refresh attempt.
CREATE TABLE IF NOT EXISTS info_timestamp (
    table_name TEXT NOT NULL,
    time_stamp TEXT NOT NULL,
    successful INTEGER NOT NULL
);
"#;
