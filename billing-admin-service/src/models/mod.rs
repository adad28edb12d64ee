//! Domain models and their row builders.

pub mod customer;
pub mod invoice;
pub mod package;

pub use customer::{Customer, CustomerFilter, CustomerFilters, CustomerRef, CustomerSort, NewCustomer};
pub use invoice::{Invoice, InvoiceFilter, InvoiceFilters, InvoiceSort, NewInvoice};
pub use package::{NewPackage, Package, PackageFilter, PackageFilters, PackageRef, PackageSort};

use crate::services::query::MappingError;
use sqlx::postgres::PgRow;
use sqlx::{Decode, Postgres, Row, Type};

/// Read one column, naming it in the error if it is missing or mistyped.
pub(crate) fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, MappingError>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get(name).map_err(|e| MappingError::new(name, e))
}
