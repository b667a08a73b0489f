//! Catalog Core - Domain entities, services, and traits.
//!
//! This crate contains the business rules for the taxon catalog.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod locales;
pub mod pagination;
pub mod taxons;

pub use pagination::{Page, PageRequest};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
