//! Traits for taxon repository and service.

use async_trait::async_trait;

use crate::pagination::{Page, PageRequest};
use crate::Result;

use super::{NewTaxon, Taxon, TaxonInput, TaxonUpdate};

/// Lookups the taxon rules need while deciding a write.
///
/// The repository hands an implementation bound to the write transaction to
/// every [`TaxonPlan`], so whatever a plan reads cannot change before its
/// result is stored.
pub trait TaxonReader {
    fn get_taxon(&mut self, id: i64) -> Result<Option<Taxon>>;
    fn get_taxon_by_code(&mut self, code: &str) -> Result<Option<Taxon>>;
    /// Parent id of the taxon, `None` for roots and unknown ids.
    fn get_parent_id(&mut self, id: i64) -> Result<Option<i64>>;
    /// Id of the taxon whose translation in `locale` uses `slug`.
    fn find_slug_owner(&mut self, locale: &str, slug: &str) -> Result<Option<i64>>;
}

/// Checks against stored data that produce the row to write.
pub type TaxonPlan<T> = Box<dyn FnOnce(&mut dyn TaxonReader) -> Result<T> + Send>;

/// Repository trait for taxon persistence operations.
#[async_trait]
pub trait TaxonRepositoryTrait: Send + Sync {
    fn count_taxons(&self) -> Result<u64>;
    /// Taxons ordered by id.
    fn list_taxons(&self, offset: i64, limit: i64) -> Result<Vec<Taxon>>;
    fn get_taxon(&self, id: i64) -> Result<Option<Taxon>>;

    /// Runs `plan` and inserts the taxon it returns, in one transaction.
    async fn create_taxon(&self, plan: TaxonPlan<NewTaxon>) -> Result<Taxon>;
    /// Runs `plan` and applies the update it returns, in one transaction.
    async fn update_taxon(&self, plan: TaxonPlan<TaxonUpdate>) -> Result<Taxon>;
    /// Deletes the taxon and its descendants, returning the number of rows
    /// removed from the taxon table (0 when the id is unknown).
    async fn delete_taxon(&self, id: i64) -> Result<usize>;
}

/// Service trait for taxon business logic.
#[async_trait]
pub trait TaxonServiceTrait: Send + Sync {
    fn get_taxons(&self, request: PageRequest) -> Result<Page<Taxon>>;
    fn get_taxon(&self, id: i64) -> Result<Taxon>;

    async fn create_taxon(&self, input: TaxonInput) -> Result<Taxon>;
    /// Replaces translations and parent; absent `parent` moves the taxon to the root.
    async fn replace_taxon(&self, id: i64, input: TaxonInput) -> Result<Taxon>;
    /// Merges the provided fields into the stored taxon.
    async fn patch_taxon(&self, id: i64, input: TaxonInput) -> Result<Taxon>;
    async fn delete_taxon(&self, id: i64) -> Result<()>;
}
