//! Migration filename and timestamp service.
//!
//! Filenames are `YYYYMMDDHHMMSS_<sanitized>.sql` in UTC; lexicographic
//! order equals chronological order. Within one process the service never
//! reuses a timestamp, advancing the second counter on collision.

use chrono::{DateTime, Duration, NaiveDateTime, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Shape every migration filename must match.
static MIGRATION_FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{14}_[A-Za-z0-9_-]+\.sql$").unwrap());

/// True if `name` is a well-formed migration filename.
pub fn is_migration_filename(name: &str) -> bool {
    MIGRATION_FILENAME_RE.is_match(name)
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Allocates strictly increasing migration filenames.
#[derive(Debug, Default)]
pub struct MigrationNamer {
    last: Option<NaiveDateTime>,
}

impl MigrationNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filename for `name` at the current wall clock.
    pub fn filename(&mut self, name: &str) -> String {
        self.filename_at(name, Utc::now())
    }

    /// Filename for `name` at an explicit instant; bumps one second past the
    /// previously issued timestamp if `now` would not sort after it.
    pub fn filename_at(&mut self, name: &str, now: DateTime<Utc>) -> String {
        let mut ts = now.naive_utc().with_nanosecond(0).unwrap_or(now.naive_utc());
        if let Some(last) = self.last {
            if ts <= last {
                ts = last + Duration::seconds(1);
            }
        }
        self.last = Some(ts);
        format!("{}_{}.sql", ts.format("%Y%m%d%H%M%S"), sanitize_name(name))
    }
}

/// ISO-8601 UTC timestamp for the migration header.
pub fn format_generated(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Best-effort timestamp from a migration filename's `YYYYMMDDHHMMSS`
/// prefix; falls back to the current instant for malformed names.
pub fn timestamp_from_filename(name: &str) -> DateTime<Utc> {
    name.get(..14)
        .and_then(|ts| chrono::NaiveDateTime::parse_from_str(ts, "%Y%m%d%H%M%S").ok())
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_name("add users table!"), "add_users_table_");
        assert_eq!(sanitize_name("ok-name_2"), "ok-name_2");
    }

    #[test]
    fn filenames_are_monotonic() {
        let mut namer = MigrationNamer::new();
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let a = namer.filename_at("first", t);
        let b = namer.filename_at("second", t);
        let c = namer.filename_at("third", t);
        assert!(a < b && b < c);
        assert!(is_migration_filename(&a));
        assert!(is_migration_filename(&b));
        assert_eq!(b, "20240301120001_second.sql");
    }
}
