use super::{by_id, map_write_error, not_found, WriteKind};
use crate::models::{Invoice, InvoiceFilter, InvoiceFilters, NewInvoice};
use crate::services::access_scope::{AccessContext, AccessScope};
use crate::services::database::{Database, PgSession};
use crate::services::metrics::record_page_request;
use crate::services::query::{
    ComposedQuery, FilterPredicate, Operator, PageRequest, PageResult, Paginator, PredicateSet,
    SqlValue,
};
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;

const ENTITY: &str = "invoice";
const SCOPE: AccessScope = AccessScope::scoped(ENTITY, Invoice::SCOPE_COLUMN);
const PAGINATOR: Paginator = Paginator::new(Invoice::TEMPLATE);

#[derive(Clone)]
pub struct InvoiceRepository {
    db: Arc<Database>,
}

impl InvoiceRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    #[instrument(skip_all, fields(entity = ENTITY))]
    pub async fn list(
        &self,
        ctx: &AccessContext,
        request: &PageRequest,
        filters: InvoiceFilters,
    ) -> Result<PageResult<Invoice>, AppError> {
        let predicates = SCOPE.apply(ctx, filters.predicates()?)?;
        record_page_request(ENTITY);

        let mut session = self.db.session().await?;
        Ok(PAGINATOR
            .get_page(&mut session, request, &predicates, Invoice::from_row)
            .await?)
    }

    /// Another customer's invoice is reported as missing to a scoped caller.
    #[instrument(skip_all, fields(entity = ENTITY))]
    pub async fn get(&self, ctx: &AccessContext, id: i64) -> Result<Invoice, AppError> {
        let predicates = SCOPE.apply(ctx, by_id(Invoice::ID_COLUMN, id))?;

        let mut session = self.db.session().await?;
        PAGINATOR
            .find_one(&mut session, &predicates, Invoice::from_row)
            .await?
            .ok_or_else(|| not_found(ENTITY))
    }

    /// Every invoice of `year` visible to the caller.
    #[instrument(skip_all, fields(entity = ENTITY, year = year))]
    pub async fn summary(&self, ctx: &AccessContext, year: i32) -> Result<Vec<Invoice>, AppError> {
        let predicates = PredicateSet::new().with(FilterPredicate::new(
            InvoiceFilter::Year,
            Operator::Eq,
            Some(year),
        )?);
        let predicates = SCOPE.apply(ctx, predicates)?;

        let mut session = self.db.session().await?;
        Ok(PAGINATOR
            .find_all(&mut session, &predicates, Invoice::from_row)
            .await?)
    }

    #[instrument(skip_all, fields(entity = ENTITY))]
    pub async fn create(&self, ctx: &AccessContext, invoice: NewInvoice) -> Result<Invoice, AppError> {
        SCOPE.authorize_write(ctx)?;

        let query = ComposedQuery {
            sql: "INSERT INTO invoices (customer_id, package_id, year, month, paid_on) \
                  VALUES ($1, $2, $3, $4, $5::date) RETURNING id"
                .to_string(),
            params: Self::write_params(&invoice),
        };

        let mut session = self.db.session().await?;
        let id = session
            .fetch_id("insert_invoice", &query)
            .await
            .map_err(|e| map_write_error(ENTITY, WriteKind::Upsert, e))?
            .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Insert returned no id")))?;

        tracing::info!(entity = ENTITY, "Invoice created");
        Self::reload(&mut session, id).await
    }

    #[instrument(skip_all, fields(entity = ENTITY))]
    pub async fn update(
        &self,
        ctx: &AccessContext,
        id: i64,
        invoice: NewInvoice,
    ) -> Result<Invoice, AppError> {
        SCOPE.authorize_write(ctx)?;

        let mut params = Self::write_params(&invoice);
        params.push(SqlValue::Int(id));
        let query = ComposedQuery {
            sql: "UPDATE invoices SET customer_id = $1, package_id = $2, year = $3, month = $4, \
                  paid_on = $5::date, updated_at = NOW() WHERE id = $6 RETURNING id"
                .to_string(),
            params,
        };

        let mut session = self.db.session().await?;
        session
            .fetch_id("update_invoice", &query)
            .await
            .map_err(|e| map_write_error(ENTITY, WriteKind::Upsert, e))?
            .ok_or_else(|| not_found(ENTITY))?;

        Self::reload(&mut session, id).await
    }

    #[instrument(skip_all, fields(entity = ENTITY))]
    pub async fn delete(&self, ctx: &AccessContext, id: i64) -> Result<(), AppError> {
        SCOPE.authorize_write(ctx)?;

        let query = ComposedQuery {
            sql: "DELETE FROM invoices WHERE id = $1".to_string(),
            params: vec![SqlValue::Int(id)],
        };

        let mut session = self.db.session().await?;
        let affected = session
            .execute("delete_invoice", &query)
            .await
            .map_err(|e| map_write_error(ENTITY, WriteKind::Delete, e))?;

        if affected == 0 {
            return Err(not_found(ENTITY));
        }
        Ok(())
    }

    fn write_params(invoice: &NewInvoice) -> Vec<SqlValue> {
        vec![
            SqlValue::Int(invoice.customer_id),
            SqlValue::Int(invoice.package_id),
            SqlValue::from(invoice.year),
            SqlValue::from(invoice.month),
            SqlValue::from(invoice.paid_on),
        ]
    }

    async fn reload(session: &mut PgSession, id: i64) -> Result<Invoice, AppError> {
        PAGINATOR
            .find_one(session, &by_id(Invoice::ID_COLUMN, id), Invoice::from_row)
            .await?
            .ok_or_else(|| not_found(ENTITY))
    }
}
