use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::debug;

use crate::{
    error::ApiResult,
    extract::{JsonPayload, PageParams, RecordId},
    main_lib::AppState,
    models::{Taxon, TaxonPage, TaxonRequest},
};

#[utoipa::path(
    get,
    path = "/api/v1/taxons/",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses((status = 200, body = TaxonPage), (status = 401))
)]
pub async fn list_taxons(
    State(state): State<Arc<AppState>>,
    PageParams(request): PageParams,
) -> ApiResult<Json<TaxonPage>> {
    debug!(
        "Listing taxons page {} (limit {})...",
        request.page(),
        request.limit()
    );
    let page = state.taxon_service.get_taxons(request)?;
    Ok(Json(TaxonPage::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/taxons/{id}",
    params(("id" = i64, Path, description = "Taxon id")),
    responses((status = 200, body = Taxon), (status = 401), (status = 404))
)]
pub async fn get_taxon(
    RecordId(id): RecordId,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Taxon>> {
    debug!("Fetching taxon {}...", id);
    let taxon = state.taxon_service.get_taxon(id)?;
    Ok(Json(Taxon::from(taxon)))
}

#[utoipa::path(
    post,
    path = "/api/v1/taxons/",
    request_body = TaxonRequest,
    responses((status = 201, body = Taxon), (status = 400), (status = 401))
)]
pub async fn create_taxon(
    State(state): State<Arc<AppState>>,
    JsonPayload(payload): JsonPayload<TaxonRequest>,
) -> ApiResult<impl IntoResponse> {
    debug!("Creating taxon {:?}...", payload.code);
    let created = Taxon::from(state.taxon_service.create_taxon(payload.into()).await?);
    let location = created.links.self_link.href.clone();
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/taxons/{id}",
    params(("id" = i64, Path, description = "Taxon id")),
    request_body = TaxonRequest,
    responses((status = 204), (status = 400), (status = 401), (status = 404))
)]
pub async fn replace_taxon(
    RecordId(id): RecordId,
    State(state): State<Arc<AppState>>,
    JsonPayload(payload): JsonPayload<TaxonRequest>,
) -> ApiResult<StatusCode> {
    debug!("Replacing taxon {}...", id);
    state.taxon_service.replace_taxon(id, payload.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/v1/taxons/{id}",
    params(("id" = i64, Path, description = "Taxon id")),
    request_body = TaxonRequest,
    responses((status = 204), (status = 400), (status = 401), (status = 404))
)]
pub async fn patch_taxon(
    RecordId(id): RecordId,
    State(state): State<Arc<AppState>>,
    JsonPayload(payload): JsonPayload<TaxonRequest>,
) -> ApiResult<StatusCode> {
    debug!("Patching taxon {}...", id);
    state.taxon_service.patch_taxon(id, payload.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/v1/taxons/{id}",
    params(("id" = i64, Path, description = "Taxon id")),
    responses((status = 204), (status = 401), (status = 404))
)]
pub async fn delete_taxon(
    RecordId(id): RecordId,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    debug!("Deleting taxon {}...", id);
    state.taxon_service.delete_taxon(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Taxon routes. Every route requires a bearer token; the auth layer is
/// added by [`crate::api::app_router`].
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/taxons", get(list_taxons).post(create_taxon))
        .route("/taxons/", get(list_taxons).post(create_taxon))
        .route(
            "/taxons/{id}",
            get(get_taxon)
                .put(replace_taxon)
                .patch(patch_taxon)
                .delete(delete_taxon),
        )
}
