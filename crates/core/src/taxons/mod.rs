//! Taxons module - domain models, services, and traits.
//!
//! A taxon is a node in the hierarchical product-category tree. Each taxon
//! has an immutable `code`, an optional parent and one translation per locale.

mod taxon_input;
mod taxon_model;
mod taxon_service;
mod taxon_traits;

pub use taxon_input::{TaxonInput, TranslationInput};
pub use taxon_model::{NewTaxon, Taxon, TaxonTranslation, TaxonUpdate};
pub use taxon_service::TaxonService;
pub use taxon_traits::{TaxonPlan, TaxonReader, TaxonRepositoryTrait, TaxonServiceTrait};
