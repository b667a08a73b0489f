//! Traits for locale repository and service.

use async_trait::async_trait;

use crate::Result;

use super::Locale;

/// Repository trait for locale persistence operations.
#[async_trait]
pub trait LocaleRepositoryTrait: Send + Sync {
    fn get_locales(&self) -> Result<Vec<Locale>>;
    fn get_locale(&self, code: &str) -> Result<Option<Locale>>;
    async fn create_locale(&self, code: String) -> Result<Locale>;
}

/// Service trait for the locale registry.
#[async_trait]
pub trait LocaleServiceTrait: Send + Sync {
    fn get_locales(&self) -> Result<Vec<Locale>>;
    fn is_registered(&self, code: &str) -> Result<bool>;
    /// Registers every code that is not known yet and returns the full registry.
    async fn ensure_locales(&self, codes: &[String]) -> Result<Vec<Locale>>;
}
