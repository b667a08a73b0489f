//! Database models for taxons.

use std::collections::{BTreeMap, HashMap};

use diesel::prelude::*;

use catalog_core::taxons::{Taxon, TaxonTranslation};

use crate::utils::text_to_datetime;

/// Database model for taxons
#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::taxons)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaxonDB {
    pub id: i64,
    pub code: String,
    pub parent_id: Option<i64>,
    pub position: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::taxons)]
pub struct NewTaxonDB {
    pub code: String,
    pub parent_id: Option<i64>,
    pub position: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::taxon_translations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaxonTranslationDB {
    pub id: i64,
    pub taxon_id: i64,
    pub locale: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::taxon_translations)]
pub struct NewTaxonTranslationDB {
    pub taxon_id: i64,
    pub locale: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

impl NewTaxonTranslationDB {
    pub fn from_domain(taxon_id: i64, translation: TaxonTranslation) -> Self {
        Self {
            taxon_id,
            locale: translation.locale,
            name: translation.name,
            slug: translation.slug,
            description: translation.description,
        }
    }
}

impl From<TaxonTranslationDB> for TaxonTranslation {
    fn from(db: TaxonTranslationDB) -> Self {
        Self {
            locale: db.locale,
            name: db.name,
            slug: db.slug,
            description: db.description,
        }
    }
}

/// Rows related to a batch of taxons, loaded with one query per table.
#[derive(Debug, Default)]
pub(crate) struct TaxonRelations {
    pub translations: HashMap<i64, Vec<TaxonTranslationDB>>,
    pub parent_codes: HashMap<i64, String>,
    /// Child codes per parent id, in position order.
    pub children: HashMap<i64, Vec<String>>,
}

impl TaxonRelations {
    pub fn build(&mut self, db: TaxonDB) -> Taxon {
        let translations: BTreeMap<String, TaxonTranslation> = self
            .translations
            .remove(&db.id)
            .unwrap_or_default()
            .into_iter()
            .map(|t| (t.locale.clone(), TaxonTranslation::from(t)))
            .collect();

        Taxon {
            id: db.id,
            parent: db
                .parent_id
                .and_then(|pid| self.parent_codes.get(&pid).cloned()),
            children: self.children.remove(&db.id).unwrap_or_default(),
            code: db.code,
            parent_id: db.parent_id,
            position: db.position,
            translations,
            created_at: text_to_datetime(&db.created_at),
            updated_at: text_to_datetime(&db.updated_at),
        }
    }
}
