//! Helpers shared by the repository implementations.

use chrono::{NaiveDateTime, SecondsFormat, Utc};
use log::error;

/// Timestamps are stored as RFC3339 text.
pub(crate) fn datetime_to_text(value: NaiveDateTime) -> String {
    value.and_utc().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time in the stored text format.
pub(crate) fn now_text() -> String {
    datetime_to_text(Utc::now().naive_utc())
}

/// Parses a stored RFC3339 timestamp, falling back to now on malformed data.
pub(crate) fn text_to_datetime(s: &str) -> NaiveDateTime {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_utc())
        .unwrap_or_else(|e| {
            error!("Failed to parse datetime '{}': {}", s, e);
            Utc::now().naive_utc()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn stored_timestamps_parse_back() {
        let value = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_micro_opt(12, 30, 5, 250)
            .unwrap();
        let text = datetime_to_text(value);
        assert_eq!(text, "2024-06-01T12:30:05.000250Z");
        assert_eq!(text_to_datetime(&text), value);
    }
}
