use super::extract::{ListQuery, ValidatedJson};
use crate::dtos::{decode_path_id, CustomerListParams, CustomerPayload, CustomerResponse};
use crate::services::access_scope::AccessContext;
use crate::services::query::PageResult;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

const ENTITY: &str = "customer";

/// GET /customers
pub async fn list_customers(
    State(state): State<AppState>,
    ctx: AccessContext,
    ListQuery(params): ListQuery<CustomerListParams>,
) -> Result<Json<PageResult<CustomerResponse>>, AppError> {
    let request = params.page_request()?;
    let filters = params.filters(&state.codec)?;
    let page = state.customers.list(&ctx, &request, filters).await?;

    Ok(Json(page.try_map(|c| CustomerResponse::build(c, &state.codec))?))
}

/// GET /customers/:id
pub async fn get_customer(
    State(state): State<AppState>,
    ctx: AccessContext,
    Path(id): Path<String>,
) -> Result<Json<CustomerResponse>, AppError> {
    let id = decode_path_id(&state.codec, ENTITY, &id)?;
    let customer = state.customers.get(&ctx, id).await?;

    Ok(Json(CustomerResponse::build(customer, &state.codec)?))
}

/// POST /customers
pub async fn create_customer(
    State(state): State<AppState>,
    ctx: AccessContext,
    ValidatedJson(payload): ValidatedJson<CustomerPayload>,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError> {
    let customer = state
        .customers
        .create(&ctx, payload.into_new(&state.codec)?)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CustomerResponse::build(customer, &state.codec)?),
    ))
}

/// PUT /customers/:id
pub async fn update_customer(
    State(state): State<AppState>,
    ctx: AccessContext,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<CustomerPayload>,
) -> Result<Json<CustomerResponse>, AppError> {
    let id = decode_path_id(&state.codec, ENTITY, &id)?;
    let customer = state
        .customers
        .update(&ctx, id, payload.into_new(&state.codec)?)
        .await?;

    Ok(Json(CustomerResponse::build(customer, &state.codec)?))
}

/// DELETE /customers/:id
pub async fn delete_customer(
    State(state): State<AppState>,
    ctx: AccessContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = decode_path_id(&state.codec, ENTITY, &id)?;
    state.customers.delete(&ctx, id).await?;

    tracing::info!(entity = ENTITY, "Customer deleted");
    Ok(StatusCode::NO_CONTENT)
}
