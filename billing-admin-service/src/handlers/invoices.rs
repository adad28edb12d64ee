use super::extract::{ListQuery, ValidatedJson};
use crate::dtos::{
    decode_path_id, InvoiceListParams, InvoicePayload, InvoiceResponse, InvoiceSummaryItem,
};
use crate::services::access_scope::AccessContext;
use crate::services::query::PageResult;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rand::rngs::OsRng;
use rand::Rng;
use service_core::error::AppError;

const ENTITY: &str = "invoice";

/// Upper bound (exclusive) of the per-response summary salt.
const SUMMARY_SALT_BOUND: u64 = 1_000;

/// GET /invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    ctx: AccessContext,
    ListQuery(params): ListQuery<InvoiceListParams>,
) -> Result<Json<PageResult<InvoiceResponse>>, AppError> {
    let request = params.page_request()?;
    let filters = params.filters(&state.codec)?;
    let page = state.invoices.list(&ctx, &request, filters).await?;

    Ok(Json(page.try_map(|i| InvoiceResponse::build(i, &state.codec))?))
}

/// GET /invoices/:id
pub async fn get_invoice(
    State(state): State<AppState>,
    ctx: AccessContext,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let id = decode_path_id(&state.codec, ENTITY, &id)?;
    let invoice = state.invoices.get(&ctx, id).await?;

    Ok(Json(InvoiceResponse::build(invoice, &state.codec)?))
}

/// GET /invoices/summary/:year
///
/// Every id in the response is encoded with the same salt.
pub async fn invoice_summary(
    State(state): State<AppState>,
    ctx: AccessContext,
    Path(year): Path<String>,
) -> Result<Json<Vec<InvoiceSummaryItem>>, AppError> {
    let year: i32 = year
        .parse()
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("year must be an integer")))?;

    let invoices = state.invoices.summary(&ctx, year).await?;
    let salt = OsRng.gen_range(0..SUMMARY_SALT_BOUND);

    let items = invoices
        .iter()
        .map(|invoice| InvoiceSummaryItem::build(invoice, &state.codec, salt))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(entity = ENTITY, year = year, count = items.len(), "Invoice summary built");
    Ok(Json(items))
}

/// POST /invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    ctx: AccessContext,
    ValidatedJson(payload): ValidatedJson<InvoicePayload>,
) -> Result<(StatusCode, Json<InvoiceResponse>), AppError> {
    let invoice = state
        .invoices
        .create(&ctx, payload.into_new(&state.codec)?)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(InvoiceResponse::build(invoice, &state.codec)?),
    ))
}

/// PUT /invoices/:id
pub async fn update_invoice(
    State(state): State<AppState>,
    ctx: AccessContext,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<InvoicePayload>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let id = decode_path_id(&state.codec, ENTITY, &id)?;
    let invoice = state
        .invoices
        .update(&ctx, id, payload.into_new(&state.codec)?)
        .await?;

    Ok(Json(InvoiceResponse::build(invoice, &state.codec)?))
}

/// DELETE /invoices/:id
pub async fn delete_invoice(
    State(state): State<AppState>,
    ctx: AccessContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = decode_path_id(&state.codec, ENTITY, &id)?;
    state.invoices.delete(&ctx, id).await?;

    tracing::info!(entity = ENTITY, "Invoice deleted");
    Ok(StatusCode::NO_CONTENT)
}
