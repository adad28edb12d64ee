//! Generic list/detail query engine shared by every entity.

pub mod composer;
pub mod page;
pub mod paginator;
pub mod predicate;

pub use composer::{ComposedQuery, QueryComposer, QueryTemplate};
pub use page::{PageRequest, PageRequestError, PageResult, SortDirection, SortField};
pub use paginator::{MappingError, Paginator, QueryError, QueryExecutor, StorageError};
pub use predicate::{
    Conjunction, FilterField, FilterPredicate, Operator, PredicateError, PredicateSet,
    PredicateValue, SqlValue,
};

use service_core::error::AppError;

impl From<PageRequestError> for AppError {
    fn from(err: PageRequestError) -> Self {
        AppError::BadRequest(anyhow::Error::new(err))
    }
}

impl From<PredicateError> for AppError {
    fn from(err: PredicateError) -> Self {
        AppError::BadRequest(anyhow::Error::new(err))
    }
}
