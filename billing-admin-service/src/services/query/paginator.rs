//! Count, fetch and map one page of rows.

use super::composer::{ComposedQuery, QueryComposer, QueryTemplate};
use super::page::{PageRequest, PageResult};
use super::predicate::PredicateSet;
use async_trait::async_trait;
use service_core::error::AppError;
use thiserror::Error;

/// The storage collaborator failed to run a statement.
#[derive(Debug, Error)]
#[error("query execution failed: {0}")]
pub struct StorageError(#[from] anyhow::Error);

impl StorageError {
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(anyhow::Error::new(err))
    }
}

/// A stored row could not be converted into its domain type.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot map column '{column}': {reason}")]
pub struct MappingError {
    pub column: String,
    pub reason: String,
}

impl MappingError {
    pub fn new(column: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            column: column.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Storage(e) => {
                tracing::error!(error = %e, "Storage failure");
                AppError::DatabaseError(anyhow::Error::new(e))
            }
            QueryError::Mapping(e) => {
                tracing::error!(column = %e.column, reason = %e.reason, "Row mapping failure");
                AppError::DataError(anyhow::Error::new(e))
            }
        }
    }
}

/// Runs composed statements. One executor serves one request.
#[async_trait]
pub trait QueryExecutor: Send {
    type Row: Send;

    /// Run a statement whose single row holds a single `COUNT(*)` column.
    async fn fetch_count(&mut self, query: &ComposedQuery) -> Result<i64, StorageError>;

    async fn fetch_rows(&mut self, query: &ComposedQuery) -> Result<Vec<Self::Row>, StorageError>;
}

/// Pages through one entity's rows.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    template: QueryTemplate,
}

impl Paginator {
    pub const fn new(template: QueryTemplate) -> Self {
        Self { template }
    }

    /// Count every match, then fetch and map the requested window.
    ///
    /// A row that fails to map fails the whole page.
    pub async fn get_page<E, T, F>(
        &self,
        executor: &mut E,
        request: &PageRequest,
        predicates: &PredicateSet,
        map: F,
    ) -> Result<PageResult<T>, QueryError>
    where
        E: QueryExecutor,
        T: Send,
        F: Fn(&E::Row) -> Result<T, MappingError> + Send,
    {
        let count = QueryComposer::count(&self.template, predicates);
        let total_elements = executor.fetch_count(&count).await?;

        let data = QueryComposer::page(&self.template, predicates, request);
        let rows = executor.fetch_rows(&data).await?;

        let content = rows.iter().map(&map).collect::<Result<Vec<_>, _>>()?;
        Ok(PageResult::new(content, request, total_elements))
    }

    /// Fetch the first match, if any.
    pub async fn find_one<E, T, F>(
        &self,
        executor: &mut E,
        predicates: &PredicateSet,
        map: F,
    ) -> Result<Option<T>, QueryError>
    where
        E: QueryExecutor,
        T: Send,
        F: Fn(&E::Row) -> Result<T, MappingError> + Send,
    {
        let query = QueryComposer::single(&self.template, predicates);
        let rows = executor.fetch_rows(&query).await?;

        Ok(rows.first().map(map).transpose()?)
    }

    /// Fetch every match in default order, with no window.
    pub async fn find_all<E, T, F>(
        &self,
        executor: &mut E,
        predicates: &PredicateSet,
        map: F,
    ) -> Result<Vec<T>, QueryError>
    where
        E: QueryExecutor,
        T: Send,
        F: Fn(&E::Row) -> Result<T, MappingError> + Send,
    {
        let query = QueryComposer::all(&self.template, predicates);
        let rows = executor.fetch_rows(&query).await?;

        Ok(rows.iter().map(map).collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::query::page::SortDirection;
    use crate::services::query::predicate::tests::TestFilter;
    use crate::services::query::predicate::{FilterPredicate, Operator, SqlValue};

    /// In-memory executor that records every statement it is asked to run.
    #[derive(Default)]
    pub(crate) struct RecordingExecutor {
        pub total: i64,
        pub rows: Vec<(i64, String)>,
        pub fail_storage: bool,
        pub executed: Vec<ComposedQuery>,
    }

    #[async_trait]
    impl QueryExecutor for RecordingExecutor {
        type Row = (i64, String);

        async fn fetch_count(&mut self, query: &ComposedQuery) -> Result<i64, StorageError> {
            self.executed.push(query.clone());
            if self.fail_storage {
                return Err(StorageError::from(anyhow::anyhow!("connection reset")));
            }
            Ok(self.total)
        }

        async fn fetch_rows(
            &mut self,
            query: &ComposedQuery,
        ) -> Result<Vec<Self::Row>, StorageError> {
            self.executed.push(query.clone());
            if self.fail_storage {
                return Err(StorageError::from(anyhow::anyhow!("connection reset")));
            }
            Ok(self.rows.clone())
        }
    }

    const PAGINATOR: Paginator = Paginator::new(QueryTemplate {
        select: "SELECT t.id, t.name FROM things t",
        count: "SELECT COUNT(*) FROM things t",
        default_sort: "t.name",
        default_direction: SortDirection::Asc,
    });

    fn map_row(row: &(i64, String)) -> Result<String, MappingError> {
        if row.1.is_empty() {
            return Err(MappingError::new("name", "empty"));
        }
        Ok(format!("{}:{}", row.0, row.1))
    }

    fn rows(n: i64) -> Vec<(i64, String)> {
        (1..=n).map(|i| (i, format!("row{}", i))).collect()
    }

    #[tokio::test]
    async fn test_count_runs_without_window() {
        let mut executor = RecordingExecutor {
            total: 23,
            rows: rows(3),
            ..Default::default()
        };
        let predicates = PredicateSet::new()
            .with(FilterPredicate::new(TestFilter::Year, Operator::Eq, Some(2024_i64)).unwrap());

        let page = PAGINATOR
            .get_page(&mut executor, &PageRequest::new(3, 10), &predicates, map_row)
            .await
            .unwrap();

        assert_eq!(executor.executed.len(), 2);
        let count = &executor.executed[0];
        let data = &executor.executed[1];
        assert_eq!(count.sql, "SELECT COUNT(*) FROM things t WHERE t.year = $1");
        assert!(data.sql.ends_with("LIMIT 10 OFFSET 20"));
        assert_eq!(count.params, data.params);
        assert_eq!(count.params, vec![SqlValue::Int(2024)]);

        assert_eq!(page.total_elements, 23);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.number_of_elements, 3);
        assert!(page.is_last);
        assert!(!page.is_first);
        assert_eq!(page.content[0], "1:row1");
    }

    #[tokio::test]
    async fn test_empty_result() {
        let mut executor = RecordingExecutor::default();

        let page = PAGINATOR
            .get_page(&mut executor, &PageRequest::new(1, 10), &PredicateSet::new(), map_row)
            .await
            .unwrap();

        assert!(page.content.is_empty());
        assert!(page.is_empty);
        assert!(page.is_first);
        assert!(page.is_last);
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn test_mapping_failure_fails_the_page() {
        let mut executor = RecordingExecutor {
            total: 2,
            rows: vec![(1, "ok".to_string()), (2, String::new())],
            ..Default::default()
        };

        let err = PAGINATOR
            .get_page(&mut executor, &PageRequest::default(), &PredicateSet::new(), map_row)
            .await
            .unwrap_err();

        match err {
            QueryError::Mapping(e) => assert_eq!(e.column, "name"),
            other => panic!("expected mapping error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_storage_failure_is_distinct_from_mapping() {
        let mut executor = RecordingExecutor {
            fail_storage: true,
            ..Default::default()
        };

        let err = PAGINATOR
            .get_page(&mut executor, &PageRequest::default(), &PredicateSet::new(), map_row)
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::Storage(_)));
        assert_eq!(executor.executed.len(), 1);
        assert!(matches!(AppError::from(err), AppError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn test_find_one_returns_first_row() {
        let mut executor = RecordingExecutor {
            rows: rows(1),
            ..Default::default()
        };

        let found = PAGINATOR
            .find_one(&mut executor, &PredicateSet::new(), map_row)
            .await
            .unwrap();

        assert_eq!(found.as_deref(), Some("1:row1"));
        assert!(executor.executed[0].sql.ends_with("LIMIT 1"));
    }

    #[tokio::test]
    async fn test_find_one_with_no_rows_is_none() {
        let mut executor = RecordingExecutor::default();

        let found = PAGINATOR
            .find_one(&mut executor, &PredicateSet::new(), map_row)
            .await
            .unwrap();

        assert!(found.is_none());
    }
}
