use super::customer::CustomerRefResponse;
use super::package::PackageRefResponse;
use super::{decode_optional_reference, decode_reference, format_date, format_timestamp};
use crate::models::{Invoice, InvoiceFilters, InvoiceSort, NewInvoice};
use crate::services::identifiers::{IdentifierCodec, IdentifierError};
use crate::services::query::{PageRequest, PageRequestError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub customer_id: Option<String>,
    pub package_id: Option<String>,
}

impl InvoiceListParams {
    pub fn page_request(&self) -> Result<PageRequest, PageRequestError> {
        PageRequest::parse::<InvoiceSort>(
            self.page,
            self.size,
            self.sort.as_deref(),
            self.direction.as_deref(),
        )
    }

    pub fn filters(self, codec: &IdentifierCodec) -> Result<InvoiceFilters, AppError> {
        Ok(InvoiceFilters {
            year: self.year,
            month: self.month,
            customer_id: decode_optional_reference(
                codec,
                "customer_id",
                self.customer_id.as_deref(),
            )?,
            package_id: decode_optional_reference(codec, "package_id", self.package_id.as_deref())?,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct InvoicePayload {
    pub customer_id: String,
    pub package_id: String,
    #[validate(range(min = 2000, max = 9999))]
    pub year: i32,
    #[validate(range(min = 1, max = 12))]
    pub month: i32,
    pub paid_on: Option<NaiveDate>,
}

impl InvoicePayload {
    pub fn into_new(self, codec: &IdentifierCodec) -> Result<NewInvoice, AppError> {
        Ok(NewInvoice {
            customer_id: decode_reference(codec, "customer_id", &self.customer_id)?,
            package_id: decode_reference(codec, "package_id", &self.package_id)?,
            year: self.year,
            month: self.month,
            paid_on: self.paid_on,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: String,
    pub customer: CustomerRefResponse,
    pub package: PackageRefResponse,
    pub year: i32,
    pub month: i32,
    pub paid_on: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl InvoiceResponse {
    pub fn build(invoice: Invoice, codec: &IdentifierCodec) -> Result<Self, IdentifierError> {
        Ok(Self {
            id: codec.encode(invoice.id)?,
            customer: CustomerRefResponse::build(invoice.customer, codec)?,
            package: PackageRefResponse::build(invoice.package, codec)?,
            year: invoice.year,
            month: invoice.month,
            paid_on: invoice.paid_on.as_ref().map(format_date),
            created_at: format_timestamp(&invoice.created_at),
            updated_at: format_timestamp(&invoice.updated_at),
        })
    }
}

/// One row of the yearly summary. All ids in a response share one salt.
#[derive(Debug, Serialize)]
pub struct InvoiceSummaryItem {
    pub id: String,
    pub customer_id: String,
    pub package_id: String,
    pub year: i32,
    pub month: i32,
    pub paid_on: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl InvoiceSummaryItem {
    pub fn build(
        invoice: &Invoice,
        codec: &IdentifierCodec,
        salt: u64,
    ) -> Result<Self, IdentifierError> {
        Ok(Self {
            id: codec.encode_with_salt(invoice.id, salt)?,
            customer_id: codec.encode_with_salt(invoice.customer.id, salt)?,
            package_id: codec.encode_with_salt(invoice.package.id, salt)?,
            year: invoice.year,
            month: invoice.month,
            paid_on: invoice.paid_on.as_ref().map(format_date),
            created_at: format_timestamp(&invoice.created_at),
            updated_at: format_timestamp(&invoice.updated_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerRef, PackageRef};
    use crate::services::identifiers::DEFAULT_ALPHABET;
    use chrono::{TimeZone, Utc};

    fn codec() -> IdentifierCodec {
        IdentifierCodec::new(DEFAULT_ALPHABET, 8, Vec::<String>::new()).unwrap()
    }

    fn invoice(id: i64, customer_id: i64) -> Invoice {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        Invoice {
            id,
            customer: CustomerRef {
                id: customer_id,
                name: "Budi".to_string(),
            },
            package: PackageRef {
                id: 2,
                name: "Home".to_string(),
                price: 150_000,
                speed: "10Mbps".to_string(),
            },
            year: 2024,
            month: 3,
            paid_on: NaiveDate::from_ymd_opt(2024, 3, 5),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_summary_ids_are_consistent_within_one_salt() {
        let codec = codec();
        let a = InvoiceSummaryItem::build(&invoice(1, 9), &codec, 77).unwrap();
        let b = InvoiceSummaryItem::build(&invoice(2, 9), &codec, 77).unwrap();

        assert_eq!(a.customer_id, b.customer_id);
        assert_eq!(a.package_id, b.package_id);
        assert_eq!(codec.decode(&a.customer_id), Some(9));
        assert_eq!(codec.decode(&b.id), Some(2));
    }

    #[test]
    fn test_response_formats_dates() {
        let response = InvoiceResponse::build(invoice(1, 9), &codec()).unwrap();

        assert_eq!(response.paid_on.as_deref(), Some("2024-03-05"));
        assert_eq!(response.created_at, "2024-03-01 08:30:00");
        assert_ne!(response.id, "1");
    }

    #[test]
    fn test_month_out_of_range_fails_validation() {
        let payload = InvoicePayload {
            customer_id: "x".to_string(),
            package_id: "y".to_string(),
            year: 2024,
            month: 13,
            paid_on: None,
        };

        assert!(payload.validate().unwrap_err().field_errors().contains_key("month"));
    }
}
