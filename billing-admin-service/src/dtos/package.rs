use super::{format_timestamp, non_empty};
use crate::models::{NewPackage, Package, PackageFilters, PackageRef, PackageSort};
use crate::services::identifiers::{IdentifierCodec, IdentifierError};
use crate::services::query::{PageRequest, PageRequestError};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct PackageListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub name: Option<String>,
    pub speed: Option<String>,
}

impl PackageListParams {
    pub fn page_request(&self) -> Result<PageRequest, PageRequestError> {
        PageRequest::parse::<PackageSort>(
            self.page,
            self.size,
            self.sort.as_deref(),
            self.direction.as_deref(),
        )
    }

    pub fn filters(self) -> PackageFilters {
        PackageFilters {
            name: non_empty(self.name),
            speed: non_empty(self.speed),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PackagePayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(length(min = 1, max = 50))]
    pub speed: String,
}

impl From<PackagePayload> for NewPackage {
    fn from(payload: PackagePayload) -> Self {
        Self {
            name: payload.name,
            price: payload.price,
            speed: payload.speed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PackageResponse {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub speed: String,
    pub created_at: String,
    pub updated_at: String,
}

impl PackageResponse {
    pub fn build(package: Package, codec: &IdentifierCodec) -> Result<Self, IdentifierError> {
        Ok(Self {
            id: codec.encode(package.id)?,
            name: package.name,
            price: package.price,
            speed: package.speed,
            created_at: format_timestamp(&package.created_at),
            updated_at: format_timestamp(&package.updated_at),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PackageRefResponse {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub speed: String,
}

impl PackageRefResponse {
    pub fn build(package: PackageRef, codec: &IdentifierCodec) -> Result<Self, IdentifierError> {
        Ok(Self {
            id: codec.encode(package.id)?,
            name: package.name,
            price: package.price,
            speed: package.speed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_rules() {
        let valid = PackagePayload {
            name: "Home 20".to_string(),
            price: 250_000,
            speed: "20Mbps".to_string(),
        };
        assert!(valid.validate().is_ok());

        let invalid = PackagePayload {
            name: String::new(),
            price: -1,
            speed: "20Mbps".to_string(),
        };
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("price"));
    }

    #[test]
    fn test_blank_filters_are_unset() {
        let params = PackageListParams {
            name: Some(String::new()),
            speed: Some("10Mbps".to_string()),
            ..Default::default()
        };

        let filters = params.filters();

        assert!(filters.name.is_none());
        assert_eq!(filters.speed.as_deref(), Some("10Mbps"));
    }
}
