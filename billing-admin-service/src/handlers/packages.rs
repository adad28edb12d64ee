use super::extract::{ListQuery, ValidatedJson};
use crate::dtos::{decode_path_id, PackageListParams, PackagePayload, PackageResponse};
use crate::services::access_scope::AccessContext;
use crate::services::query::PageResult;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

const ENTITY: &str = "package";

/// GET /packages
pub async fn list_packages(
    State(state): State<AppState>,
    ctx: AccessContext,
    ListQuery(params): ListQuery<PackageListParams>,
) -> Result<Json<PageResult<PackageResponse>>, AppError> {
    let request = params.page_request()?;
    let page = state
        .packages
        .list(&ctx, &request, params.filters())
        .await?;

    Ok(Json(page.try_map(|p| PackageResponse::build(p, &state.codec))?))
}

/// GET /packages/:id
pub async fn get_package(
    State(state): State<AppState>,
    ctx: AccessContext,
    Path(id): Path<String>,
) -> Result<Json<PackageResponse>, AppError> {
    let id = decode_path_id(&state.codec, ENTITY, &id)?;
    let package = state.packages.get(&ctx, id).await?;

    Ok(Json(PackageResponse::build(package, &state.codec)?))
}

/// POST /packages
pub async fn create_package(
    State(state): State<AppState>,
    ctx: AccessContext,
    ValidatedJson(payload): ValidatedJson<PackagePayload>,
) -> Result<(StatusCode, Json<PackageResponse>), AppError> {
    let package = state.packages.create(&ctx, payload.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(PackageResponse::build(package, &state.codec)?),
    ))
}

/// PUT /packages/:id
pub async fn update_package(
    State(state): State<AppState>,
    ctx: AccessContext,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<PackagePayload>,
) -> Result<Json<PackageResponse>, AppError> {
    let id = decode_path_id(&state.codec, ENTITY, &id)?;
    let package = state.packages.update(&ctx, id, payload.into()).await?;

    Ok(Json(PackageResponse::build(package, &state.codec)?))
}

/// DELETE /packages/:id
pub async fn delete_package(
    State(state): State<AppState>,
    ctx: AccessContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = decode_path_id(&state.codec, ENTITY, &id)?;
    state.packages.delete(&ctx, id).await?;

    tracing::info!(entity = ENTITY, "Package deleted");
    Ok(StatusCode::NO_CONTENT)
}
