//! Domain models for locales.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A locale registered in the catalog (e.g. `en_US`, `nl_NL`, `fr`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locale {
    pub code: String,
    pub created_at: NaiveDateTime,
}

/// Accepts a 2-3 letter lowercase language, optionally followed by `_` and a
/// 2 letter uppercase region or a 3 digit area code.
pub fn is_valid_locale_code(code: &str) -> bool {
    let (language, region) = match code.split_once('_') {
        Some((language, region)) => (language, Some(region)),
        None => (code, None),
    };

    let language_ok =
        (2..=3).contains(&language.len()) && language.chars().all(|c| c.is_ascii_lowercase());
    let region_ok = match region {
        None => true,
        Some(r) if r.len() == 2 => r.chars().all(|c| c.is_ascii_uppercase()),
        Some(r) if r.len() == 3 => r.chars().all(|c| c.is_ascii_digit()),
        Some(_) => false,
    };

    language_ok && region_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_locale_codes() {
        for code in ["en", "en_US", "nl_NL", "fil", "es_419"] {
            assert!(is_valid_locale_code(code), "{code} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_locale_codes() {
        for code in ["", "e", "EN_us", "en-US", "en__US", "en_USA", "english", "en_U5"] {
            assert!(!is_valid_locale_code(code), "{code} should be invalid");
        }
    }
}
