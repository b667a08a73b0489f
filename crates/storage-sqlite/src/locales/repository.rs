//! Repository implementation for locales.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;

use catalog_core::locales::{Locale, LocaleRepositoryTrait};
use catalog_core::Result;

use super::model::LocaleDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::locales;
use crate::utils::now_text;

pub struct LocaleRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl LocaleRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl LocaleRepositoryTrait for LocaleRepository {
    fn get_locales(&self) -> Result<Vec<Locale>> {
        let mut conn = get_connection(&self.pool)?;
        let results = locales::table
            .order(locales::code.asc())
            .select(LocaleDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        Ok(results.into_iter().map(Locale::from).collect())
    }

    fn get_locale(&self, code: &str) -> Result<Option<Locale>> {
        let mut conn = get_connection(&self.pool)?;
        let result = locales::table
            .find(code)
            .select(LocaleDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(result.map(Locale::from))
    }

    async fn create_locale(&self, code: String) -> Result<Locale> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Locale> {
                let db = LocaleDB {
                    code,
                    created_at: now_text(),
                };
                let result = diesel::insert_into(locales::table)
                    .values(&db)
                    .returning(LocaleDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Locale::from(result))
            })
            .await
    }
}
