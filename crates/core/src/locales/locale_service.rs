//! Locale registry service implementation.

use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::errors::ValidationError;
use crate::Result;

use super::{is_valid_locale_code, Locale, LocaleRepositoryTrait, LocaleServiceTrait};

pub struct LocaleService {
    repository: Arc<dyn LocaleRepositoryTrait>,
}

impl LocaleService {
    pub fn new(repository: Arc<dyn LocaleRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl LocaleServiceTrait for LocaleService {
    fn get_locales(&self) -> Result<Vec<Locale>> {
        self.repository.get_locales()
    }

    fn is_registered(&self, code: &str) -> Result<bool> {
        Ok(self.repository.get_locale(code)?.is_some())
    }

    async fn ensure_locales(&self, codes: &[String]) -> Result<Vec<Locale>> {
        if let Some(invalid) = codes.iter().find(|code| !is_valid_locale_code(code)) {
            return Err(ValidationError::InvalidInput(format!(
                "'{invalid}' is not a valid locale code"
            ))
            .into());
        }

        for code in codes {
            if self.repository.get_locale(code)?.is_none() {
                info!("Registering locale {}", code);
                self.repository.create_locale(code.clone()).await?;
            }
        }

        self.repository.get_locales()
    }
}
