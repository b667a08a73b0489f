//! Domain models for taxons.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A node of the category tree, with its translations keyed by locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxon {
    pub id: i64,
    pub code: String,
    pub parent_id: Option<i64>,
    /// Code of the parent taxon, resolved from `parent_id`.
    pub parent: Option<String>,
    pub position: i32,
    /// Codes of the direct children, ordered by position.
    pub children: Vec<String>,
    pub translations: BTreeMap<String, TaxonTranslation>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Taxon {
    pub fn translation(&self, locale: &str) -> Option<&TaxonTranslation> {
        self.translations.get(locale)
    }
}

/// Locale-scoped display name and URL slug of a taxon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonTranslation {
    pub locale: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

/// Data for creating a new taxon, after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTaxon {
    pub code: String,
    pub parent_id: Option<i64>,
    /// `None` appends the taxon after its last sibling.
    pub position: Option<i32>,
    pub translations: Vec<TaxonTranslation>,
}

/// Full desired state of an existing taxon.
///
/// The stored translation set is replaced by `translations`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonUpdate {
    pub id: i64,
    pub parent_id: Option<i64>,
    /// `None` appends the taxon after its last sibling under `parent_id`.
    pub position: Option<i32>,
    pub translations: Vec<TaxonTranslation>,
}
