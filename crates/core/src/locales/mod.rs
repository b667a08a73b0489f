//! Locales module - the registry of locale codes translations may use.

mod locale_model;
mod locale_service;
mod locale_traits;

pub use locale_model::{is_valid_locale_code, Locale};
pub use locale_service::LocaleService;
pub use locale_traits::{LocaleRepositoryTrait, LocaleServiceTrait};
