//! Database models for locales.

use diesel::prelude::*;

use catalog_core::locales::Locale;

use crate::utils::text_to_datetime;

#[derive(Queryable, Selectable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::locales)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LocaleDB {
    pub code: String,
    pub created_at: String,
}

impl From<LocaleDB> for Locale {
    fn from(db: LocaleDB) -> Self {
        Self {
            created_at: text_to_datetime(&db.created_at),
            code: db.code,
        }
    }
}
