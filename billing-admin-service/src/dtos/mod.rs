//! Request and response bodies. Every id crossing this boundary is opaque.

pub mod customer;
pub mod invoice;
pub mod package;

pub use customer::{CustomerListParams, CustomerPayload, CustomerRefResponse, CustomerResponse};
pub use invoice::{InvoiceListParams, InvoicePayload, InvoiceResponse, InvoiceSummaryItem};
pub use package::{PackageListParams, PackagePayload, PackageRefResponse, PackageResponse};

use crate::services::IdentifierCodec;
use chrono::{DateTime, NaiveDate, Utc};
use service_core::error::AppError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn format_date(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

/// Decode an opaque id supplied as a filter or payload reference.
pub(crate) fn decode_reference(
    codec: &IdentifierCodec,
    field: &str,
    value: &str,
) -> Result<i64, AppError> {
    codec.decode(value).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("{} is not a valid identifier", field))
    })
}

/// Decode an optional opaque filter value. Blank values count as unset.
pub(crate) fn decode_optional_reference(
    codec: &IdentifierCodec,
    field: &str,
    value: Option<&str>,
) -> Result<Option<i64>, AppError> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| decode_reference(codec, field, v))
        .transpose()
}

/// Decode an opaque id taken from the request path.
///
/// An id that does not decode is reported exactly like a missing row.
pub fn decode_path_id(codec: &IdentifierCodec, entity: &str, value: &str) -> Result<i64, AppError> {
    codec
        .decode(value)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("{} not found", entity)))
}

/// Treat empty query parameters (`?name=`) as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
