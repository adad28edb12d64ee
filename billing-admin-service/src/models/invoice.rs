use super::column;
use super::customer::CustomerRef;
use super::package::PackageRef;
use crate::services::query::{
    FilterField, FilterPredicate, MappingError, Operator, PredicateError, PredicateSet,
    QueryTemplate, SortDirection, SortField,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;

/// One month's bill for a customer.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub id: i64,
    pub customer: CustomerRef,
    pub package: PackageRef,
    pub year: i32,
    pub month: i32,
    /// `None` while unpaid
    pub paid_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub customer_id: i64,
    pub package_id: i64,
    pub year: i32,
    pub month: i32,
    pub paid_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy)]
pub enum InvoiceFilter {
    Year,
    Month,
    CustomerId,
    PackageId,
}

impl FilterField for InvoiceFilter {
    fn key(self) -> &'static str {
        match self {
            InvoiceFilter::Year => "year",
            InvoiceFilter::Month => "month",
            InvoiceFilter::CustomerId => "customer_id",
            InvoiceFilter::PackageId => "package_id",
        }
    }

    fn column(self) -> &'static str {
        match self {
            InvoiceFilter::Year => "i.year",
            InvoiceFilter::Month => "i.month",
            InvoiceFilter::CustomerId => Invoice::SCOPE_COLUMN,
            InvoiceFilter::PackageId => "i.package_id",
        }
    }

    fn allowed_operators(self) -> &'static [Operator] {
        match self {
            InvoiceFilter::Year | InvoiceFilter::Month => &[
                Operator::Eq,
                Operator::Gte,
                Operator::Lte,
                Operator::In,
            ],
            InvoiceFilter::CustomerId | InvoiceFilter::PackageId => &[Operator::Eq, Operator::In],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum InvoiceSort {
    PaidOn,
    Year,
    Month,
    CreatedAt,
}

impl SortField for InvoiceSort {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "paid_on" => Some(InvoiceSort::PaidOn),
            "year" => Some(InvoiceSort::Year),
            "month" => Some(InvoiceSort::Month),
            "created_at" => Some(InvoiceSort::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            InvoiceSort::PaidOn => "i.paid_on",
            InvoiceSort::Year => "i.year",
            InvoiceSort::Month => "i.month",
            InvoiceSort::CreatedAt => "i.created_at",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceFilters {
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub customer_id: Option<i64>,
    pub package_id: Option<i64>,
}

impl InvoiceFilters {
    pub fn predicates(self) -> Result<PredicateSet, PredicateError> {
        Ok(PredicateSet::new()
            .with(FilterPredicate::new(InvoiceFilter::Year, Operator::Eq, self.year)?)
            .with(FilterPredicate::new(InvoiceFilter::Month, Operator::Eq, self.month)?)
            .with(FilterPredicate::new(
                InvoiceFilter::CustomerId,
                Operator::Eq,
                self.customer_id,
            )?)
            .with(FilterPredicate::new(
                InvoiceFilter::PackageId,
                Operator::Eq,
                self.package_id,
            )?))
    }
}

impl Invoice {
    pub const TEMPLATE: QueryTemplate = QueryTemplate {
        select: "SELECT i.id, i.customer_id, c.name AS customer_name, \
                 i.package_id, p.name AS package_name, p.price AS package_price, \
                 p.speed AS package_speed, i.year, i.month, i.paid_on, \
                 i.created_at, i.updated_at \
                 FROM invoices i \
                 JOIN customers c ON c.id = i.customer_id \
                 JOIN packages p ON p.id = i.package_id",
        count: "SELECT COUNT(*) FROM invoices i \
                JOIN customers c ON c.id = i.customer_id \
                JOIN packages p ON p.id = i.package_id",
        default_sort: "i.paid_on",
        default_direction: SortDirection::Desc,
    };

    pub const ID_COLUMN: &'static str = "i.id";

    /// Column a USER's bound customer id is forced onto.
    pub const SCOPE_COLUMN: &'static str = "i.customer_id";

    pub fn from_row(row: &PgRow) -> Result<Self, MappingError> {
        let month: i32 = column(row, "month")?;
        if !(1..=12).contains(&month) {
            return Err(MappingError::new("month", format!("{} is not a month", month)));
        }

        Ok(Self {
            id: column(row, "id")?,
            customer: CustomerRef::from_joined_row(row)?,
            package: PackageRef::from_joined_row(row)?,
            year: column(row, "year")?,
            month,
            paid_on: column(row, "paid_on")?,
            created_at: column(row, "created_at")?,
            updated_at: column(row, "updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::access_scope::{AccessContext, AccessScope, Role};
    use crate::services::query::{PageRequest, QueryComposer, SqlValue};

    #[test]
    fn test_user_filter_on_other_customer_is_replaced() {
        let scope = AccessScope::scoped("invoice", Invoice::SCOPE_COLUMN);
        let ctx = AccessContext {
            subject: "u".to_string(),
            role: Role::User,
            scope_id: Some(7),
        };
        let predicates = InvoiceFilters {
            year: Some(2024),
            customer_id: Some(3),
            ..Default::default()
        }
        .predicates()
        .unwrap();

        let predicates = scope.apply(&ctx, predicates).unwrap();
        let query = QueryComposer::page(&Invoice::TEMPLATE, &predicates, &PageRequest::default());

        assert!(query
            .sql
            .contains("WHERE i.year = $1 AND i.customer_id = $2 ORDER BY i.paid_on DESC"));
        assert_eq!(query.params, vec![SqlValue::Int(2024), SqlValue::Int(7)]);
    }
}
