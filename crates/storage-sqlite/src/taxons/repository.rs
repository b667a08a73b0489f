//! Repository implementation for taxons.

use async_trait::async_trait;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;

use catalog_core::errors::DatabaseError;
use catalog_core::taxons::{
    NewTaxon, Taxon, TaxonPlan, TaxonReader, TaxonRepositoryTrait, TaxonTranslation, TaxonUpdate,
};
use catalog_core::Result;

use super::model::{
    NewTaxonDB, NewTaxonTranslationDB, TaxonDB, TaxonRelations, TaxonTranslationDB,
};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{taxon_translations, taxons};
use crate::utils::now_text;

pub struct TaxonRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TaxonRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Loads translations, parent codes and child codes for `rows` and builds
/// the domain taxons in the same order.
fn hydrate(conn: &mut SqliteConnection, rows: Vec<TaxonDB>) -> Result<Vec<Taxon>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = rows.iter().map(|t| t.id).collect();
    let parent_ids: Vec<i64> = rows.iter().filter_map(|t| t.parent_id).collect();

    let mut relations = TaxonRelations::default();

    let translations = taxon_translations::table
        .filter(taxon_translations::taxon_id.eq_any(&ids))
        .order(taxon_translations::locale.asc())
        .select(TaxonTranslationDB::as_select())
        .load(conn)
        .map_err(StorageError::from)?;
    for translation in translations {
        relations
            .translations
            .entry(translation.taxon_id)
            .or_default()
            .push(translation);
    }

    if !parent_ids.is_empty() {
        relations.parent_codes = taxons::table
            .filter(taxons::id.eq_any(&parent_ids))
            .select((taxons::id, taxons::code))
            .load::<(i64, String)>(conn)
            .map_err(StorageError::from)?
            .into_iter()
            .collect::<HashMap<_, _>>();
    }

    let children = taxons::table
        .filter(taxons::parent_id.eq_any(&ids))
        .order((taxons::position.asc(), taxons::id.asc()))
        .select((taxons::parent_id, taxons::code))
        .load::<(Option<i64>, String)>(conn)
        .map_err(StorageError::from)?;
    for (parent_id, code) in children {
        if let Some(parent_id) = parent_id {
            relations.children.entry(parent_id).or_default().push(code);
        }
    }

    Ok(rows.into_iter().map(|row| relations.build(row)).collect())
}

fn hydrate_one(conn: &mut SqliteConnection, row: Option<TaxonDB>) -> Result<Option<Taxon>> {
    match row {
        Some(row) => Ok(hydrate(conn, vec![row])?.pop()),
        None => Ok(None),
    }
}

/// Position after the last child of `parent_id` (root level when `None`).
fn next_position(
    conn: &mut SqliteConnection,
    parent_id: Option<i64>,
    exclude_id: Option<i64>,
) -> Result<i32> {
    let mut query = taxons::table.select(max(taxons::position)).into_boxed();
    query = match parent_id {
        Some(pid) => query.filter(taxons::parent_id.eq(pid)),
        None => query.filter(taxons::parent_id.is_null()),
    };
    if let Some(id) = exclude_id {
        query = query.filter(taxons::id.ne(id));
    }

    let last: Option<i32> = query.first(conn).map_err(StorageError::from)?;
    Ok(last.map_or(0, |p| p + 1))
}

fn insert_translations(
    conn: &mut SqliteConnection,
    taxon_id: i64,
    translations: Vec<TaxonTranslation>,
) -> Result<()> {
    for translation in translations {
        diesel::insert_into(taxon_translations::table)
            .values(NewTaxonTranslationDB::from_domain(taxon_id, translation))
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    Ok(())
}

fn reload(conn: &mut SqliteConnection, id: i64) -> Result<Taxon> {
    load_taxon(conn, id)?
        .ok_or_else(|| DatabaseError::NotFound(format!("Taxon {id} not found")).into())
}

/// Ids of the taxon and all of its descendants, or empty when `id` is unknown.
fn subtree_ids(conn: &mut SqliteConnection, id: i64) -> Result<Vec<i64>> {
    let exists = taxons::table
        .find(id)
        .select(taxons::id)
        .first::<i64>(conn)
        .optional()
        .map_err(StorageError::from)?;
    let Some(root) = exists else {
        return Ok(Vec::new());
    };

    let mut ids = vec![root];
    let mut frontier = vec![root];
    while !frontier.is_empty() {
        frontier = taxons::table
            .filter(taxons::parent_id.eq_any(&frontier))
            .select(taxons::id)
            .load::<i64>(conn)
            .map_err(StorageError::from)?;
        frontier.retain(|child| !ids.contains(child));
        ids.extend_from_slice(&frontier);
    }
    Ok(ids)
}

fn load_taxon(conn: &mut SqliteConnection, id: i64) -> Result<Option<Taxon>> {
    let row = taxons::table
        .find(id)
        .select(TaxonDB::as_select())
        .first(conn)
        .optional()
        .map_err(StorageError::from)?;
    hydrate_one(conn, row)
}

/// [`TaxonReader`] over a single connection. Inside a writer job this is the
/// connection holding the immediate transaction.
struct ConnReader<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> ConnReader<'a> {
    fn new(conn: &'a mut SqliteConnection) -> Self {
        Self { conn }
    }
}

impl TaxonReader for ConnReader<'_> {
    fn get_taxon(&mut self, id: i64) -> Result<Option<Taxon>> {
        load_taxon(self.conn, id)
    }

    fn get_taxon_by_code(&mut self, code: &str) -> Result<Option<Taxon>> {
        let row = taxons::table
            .filter(taxons::code.eq(code))
            .select(TaxonDB::as_select())
            .first(self.conn)
            .optional()
            .map_err(StorageError::from)?;
        hydrate_one(self.conn, row)
    }

    fn get_parent_id(&mut self, id: i64) -> Result<Option<i64>> {
        let parent = taxons::table
            .find(id)
            .select(taxons::parent_id)
            .first::<Option<i64>>(self.conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(parent.flatten())
    }

    fn find_slug_owner(&mut self, locale: &str, slug: &str) -> Result<Option<i64>> {
        let owner = taxon_translations::table
            .filter(taxon_translations::locale.eq(locale))
            .filter(taxon_translations::slug.eq(slug))
            .select(taxon_translations::taxon_id)
            .first::<i64>(self.conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(owner)
    }
}

#[async_trait]
impl TaxonRepositoryTrait for TaxonRepository {
    fn count_taxons(&self) -> Result<u64> {
        let mut conn = get_connection(&self.pool)?;
        let count: i64 = taxons::table
            .count()
            .get_result(&mut conn)
            .map_err(StorageError::from)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn list_taxons(&self, offset: i64, limit: i64) -> Result<Vec<Taxon>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = taxons::table
            .order(taxons::id.asc())
            .offset(offset)
            .limit(limit)
            .select(TaxonDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        hydrate(&mut conn, rows)
    }

    fn get_taxon(&self, id: i64) -> Result<Option<Taxon>> {
        let mut conn = get_connection(&self.pool)?;
        load_taxon(&mut conn, id)
    }

    async fn create_taxon(&self, plan: TaxonPlan<NewTaxon>) -> Result<Taxon> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Taxon> {
                let taxon = plan(&mut ConnReader::new(conn))?;
                let position = match taxon.position {
                    Some(position) => position,
                    None => next_position(conn, taxon.parent_id, None)?,
                };
                let now = now_text();
                let row = NewTaxonDB {
                    code: taxon.code,
                    parent_id: taxon.parent_id,
                    position,
                    created_at: now.clone(),
                    updated_at: now,
                };

                let created = diesel::insert_into(taxons::table)
                    .values(&row)
                    .returning(TaxonDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                insert_translations(conn, created.id, taxon.translations)?;

                reload(conn, created.id)
            })
            .await
    }

    async fn update_taxon(&self, plan: TaxonPlan<TaxonUpdate>) -> Result<Taxon> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Taxon> {
                let update = plan(&mut ConnReader::new(conn))?;
                let id = update.id;
                let position = match update.position {
                    Some(position) => position,
                    None => next_position(conn, update.parent_id, Some(id))?,
                };

                let updated = diesel::update(taxons::table.find(id))
                    .set((
                        taxons::parent_id.eq(update.parent_id),
                        taxons::position.eq(position),
                        taxons::updated_at.eq(now_text()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(DatabaseError::NotFound(format!("Taxon {id} not found")).into());
                }

                diesel::delete(
                    taxon_translations::table.filter(taxon_translations::taxon_id.eq(id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                insert_translations(conn, id, update.translations)?;

                reload(conn, id)
            })
            .await
    }

    async fn delete_taxon(&self, id: i64) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let ids = subtree_ids(conn, id)?;
                if ids.is_empty() {
                    return Ok(0);
                }

                diesel::delete(
                    taxon_translations::table.filter(taxon_translations::taxon_id.eq_any(&ids)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                let deleted = diesel::delete(taxons::table.filter(taxons::id.eq_any(&ids)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(deleted)
            })
            .await
    }
}
