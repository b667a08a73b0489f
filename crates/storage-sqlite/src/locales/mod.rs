//! SQLite storage implementation for the locale registry.

mod model;
mod repository;

pub use model::LocaleDB;
pub use repository::LocaleRepository;
