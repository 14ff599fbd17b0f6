//! Shared types and helpers for the database layer

pub mod errors;

use chrono::{NaiveDate, SecondsFormat, Utc};

pub use errors::DatabaseError;

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Fixed-width UTC timestamp so that TEXT columns sort chronologically.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current UTC calendar day, the key for streaks and daily limits.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_have_fixed_width() {
        let stamp = now_timestamp();
        assert_eq!(stamp.len(), "2024-01-01T00:00:00.000000Z".len());
        assert!(stamp.ends_with('Z'));
    }
}
