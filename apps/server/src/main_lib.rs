use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use catalog_core::{
    locales::{LocaleService, LocaleServiceTrait},
    taxons::{TaxonService, TaxonServiceTrait},
};
use catalog_storage_sqlite::{
    db::{self, spawn_writer},
    locales::LocaleRepository,
    taxons::TaxonRepository,
};

use crate::{
    auth::AuthManager,
    config::{Config, LogFormat},
};

pub struct AppState {
    pub taxon_service: Arc<dyn TaxonServiceTrait + Send + Sync>,
    pub auth: Arc<AuthManager>,
    /// Page size for list requests without `limit`.
    pub page_size: u32,
}

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = spawn_writer(pool.as_ref().clone())?;

    let locale_repository = Arc::new(LocaleRepository::new(pool.clone(), writer.clone()));
    let locale_service = Arc::new(LocaleService::new(locale_repository));
    let locales = locale_service.ensure_locales(&config.locales).await?;
    tracing::info!(
        "Registered locales: {}",
        locales
            .iter()
            .map(|l| l.code.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let taxon_repository = Arc::new(TaxonRepository::new(pool.clone(), writer.clone()));
    let taxon_service = Arc::new(TaxonService::new(taxon_repository, locale_service));

    let auth = Arc::new(AuthManager::new(config.api_tokens.clone()));
    if !auth.accepts_tokens() {
        tracing::warn!("CATALOG_API_TOKENS is empty; taxon routes will reject every request");
    }

    Ok(Arc::new(AppState {
        taxon_service,
        auth,
        page_size: config.page_size,
    }))
}
