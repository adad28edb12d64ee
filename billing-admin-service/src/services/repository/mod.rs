//! Entity repositories.
//!
//! Every read follows the same order: apply the access scope, check out a
//! connection, then run the paginator. A rejected caller never reaches storage.

pub mod customers;
pub mod invoices;
pub mod packages;

pub use customers::CustomerRepository;
pub use invoices::InvoiceRepository;
pub use packages::PackageRepository;

use crate::services::query::{FilterPredicate, Operator, PredicateSet, SqlValue};
use service_core::error::AppError;

/// Which kind of write produced a database error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteKind {
    Upsert,
    Delete,
}

/// Translate constraint violations into client errors.
pub(crate) fn map_write_error(entity: &str, kind: WriteKind, err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::Conflict(anyhow::anyhow!("{} already exists", entity));
        }
        if db_err.is_foreign_key_violation() {
            return match kind {
                WriteKind::Upsert => AppError::BadRequest(anyhow::anyhow!(
                    "{} references a record that does not exist",
                    entity
                )),
                WriteKind::Delete => AppError::Conflict(anyhow::anyhow!(
                    "{} is still referenced by other records",
                    entity
                )),
            };
        }
        if db_err.is_check_violation() {
            return AppError::BadRequest(anyhow::anyhow!("{} has invalid values", entity));
        }
    }

    tracing::error!(error = %err, entity = entity, "Write failed");
    AppError::DatabaseError(anyhow::anyhow!("Failed to write {}: {}", entity, err))
}

/// Predicates selecting one row by key, on top of whatever scope applies.
pub(crate) fn by_id(column: &'static str, id: i64) -> PredicateSet {
    let mut predicates = PredicateSet::new();
    predicates.enforce(FilterPredicate::on_column(
        column,
        Operator::Eq,
        SqlValue::Int(id).into(),
    ));
    predicates
}

pub(crate) fn not_found(entity: &str) -> AppError {
    AppError::NotFound(anyhow::anyhow!("{} not found", entity))
}
