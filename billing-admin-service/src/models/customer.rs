use super::column;
use super::package::PackageRef;
use crate::services::query::{
    FilterField, FilterPredicate, MappingError, Operator, PredicateError, PredicateSet,
    QueryTemplate, SortDirection, SortField,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;

/// Subscriber with an active package.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub package: PackageRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub package_id: i64,
}

#[derive(Debug, Clone, Copy)]
pub enum CustomerFilter {
    Name,
    PackageId,
}

impl FilterField for CustomerFilter {
    fn key(self) -> &'static str {
        match self {
            CustomerFilter::Name => "name",
            CustomerFilter::PackageId => "package_id",
        }
    }

    fn column(self) -> &'static str {
        match self {
            CustomerFilter::Name => "c.name",
            CustomerFilter::PackageId => "c.package_id",
        }
    }

    fn allowed_operators(self) -> &'static [Operator] {
        match self {
            CustomerFilter::Name => &[Operator::ILike, Operator::Eq],
            CustomerFilter::PackageId => &[Operator::Eq, Operator::In],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum CustomerSort {
    Name,
    CreatedAt,
}

impl SortField for CustomerSort {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "name" => Some(CustomerSort::Name),
            "created_at" => Some(CustomerSort::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            CustomerSort::Name => "c.name",
            CustomerSort::CreatedAt => "c.created_at",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomerFilters {
    pub name: Option<String>,
    pub package_id: Option<i64>,
}

impl CustomerFilters {
    pub fn predicates(self) -> Result<PredicateSet, PredicateError> {
        Ok(PredicateSet::new()
            .with(FilterPredicate::new(CustomerFilter::Name, Operator::ILike, self.name)?)
            .with(FilterPredicate::new(
                CustomerFilter::PackageId,
                Operator::Eq,
                self.package_id,
            )?))
    }
}

impl Customer {
    pub const TEMPLATE: QueryTemplate = QueryTemplate {
        select: "SELECT c.id, c.name, c.address, c.phone, c.package_id, \
                 p.name AS package_name, p.price AS package_price, p.speed AS package_speed, \
                 c.created_at, c.updated_at \
                 FROM customers c JOIN packages p ON p.id = c.package_id",
        count: "SELECT COUNT(*) FROM customers c JOIN packages p ON p.id = c.package_id",
        default_sort: "c.name",
        default_direction: SortDirection::Asc,
    };

    pub const ID_COLUMN: &'static str = "c.id";

    pub fn from_row(row: &PgRow) -> Result<Self, MappingError> {
        Ok(Self {
            id: column(row, "id")?,
            name: column(row, "name")?,
            address: column(row, "address")?,
            phone: column(row, "phone")?,
            package: PackageRef::from_joined_row(row)?,
            created_at: column(row, "created_at")?,
            updated_at: column(row, "updated_at")?,
        })
    }
}

impl CustomerRef {
    pub(crate) fn from_joined_row(row: &PgRow) -> Result<Self, MappingError> {
        Ok(Self {
            id: column(row, "customer_id")?,
            name: column(row, "customer_name")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::query::{QueryComposer, SqlValue};

    #[test]
    fn test_package_filter_binds_decoded_key() {
        let predicates = CustomerFilters {
            name: None,
            package_id: Some(12),
        }
        .predicates()
        .unwrap();

        let query = QueryComposer::compose(Customer::TEMPLATE.count, &predicates);

        assert!(query.sql.ends_with("WHERE c.package_id = $1"));
        assert_eq!(query.params, vec![SqlValue::Int(12)]);
    }

    #[test]
    fn test_name_filter_cannot_use_range_operators() {
        assert!(FilterPredicate::new(CustomerFilter::Name, Operator::Gt, Some("a")).is_err());
    }
}
