use super::package::PackageRefResponse;
use super::{decode_optional_reference, decode_reference, format_timestamp, non_empty};
use crate::models::{Customer, CustomerFilters, CustomerRef, CustomerSort, NewCustomer};
use crate::services::identifiers::{IdentifierCodec, IdentifierError};
use crate::services::query::{PageRequest, PageRequestError};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct CustomerListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub name: Option<String>,
    pub package_id: Option<String>,
}

impl CustomerListParams {
    pub fn page_request(&self) -> Result<PageRequest, PageRequestError> {
        PageRequest::parse::<CustomerSort>(
            self.page,
            self.size,
            self.sort.as_deref(),
            self.direction.as_deref(),
        )
    }

    pub fn filters(self, codec: &IdentifierCodec) -> Result<CustomerFilters, AppError> {
        Ok(CustomerFilters {
            package_id: decode_optional_reference(codec, "package_id", self.package_id.as_deref())?,
            name: non_empty(self.name),
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CustomerPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
    #[validate(length(min = 6, max = 20))]
    pub phone: String,
    pub package_id: String,
}

impl CustomerPayload {
    pub fn into_new(self, codec: &IdentifierCodec) -> Result<NewCustomer, AppError> {
        Ok(NewCustomer {
            package_id: decode_reference(codec, "package_id", &self.package_id)?,
            name: self.name,
            address: self.address,
            phone: self.phone,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub package: PackageRefResponse,
    pub created_at: String,
    pub updated_at: String,
}

impl CustomerResponse {
    pub fn build(customer: Customer, codec: &IdentifierCodec) -> Result<Self, IdentifierError> {
        Ok(Self {
            id: codec.encode(customer.id)?,
            name: customer.name,
            address: customer.address,
            phone: customer.phone,
            package: PackageRefResponse::build(customer.package, codec)?,
            created_at: format_timestamp(&customer.created_at),
            updated_at: format_timestamp(&customer.updated_at),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerRefResponse {
    pub id: String,
    pub name: String,
}

impl CustomerRefResponse {
    pub fn build(customer: CustomerRef, codec: &IdentifierCodec) -> Result<Self, IdentifierError> {
        Ok(Self {
            id: codec.encode(customer.id)?,
            name: customer.name,
        })
    }
}
