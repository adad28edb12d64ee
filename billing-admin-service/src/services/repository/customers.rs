use super::{by_id, map_write_error, not_found, WriteKind};
use crate::models::{Customer, CustomerFilters, NewCustomer};
use crate::services::access_scope::{AccessContext, AccessScope};
use crate::services::database::{Database, PgSession};
use crate::services::metrics::record_page_request;
use crate::services::query::{ComposedQuery, PageRequest, PageResult, Paginator, SqlValue};
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;

const ENTITY: &str = "customer";
const SCOPE: AccessScope = AccessScope::admin_only(ENTITY);
const PAGINATOR: Paginator = Paginator::new(Customer::TEMPLATE);

#[derive(Clone)]
pub struct CustomerRepository {
    db: Arc<Database>,
}

impl CustomerRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    #[instrument(skip_all, fields(entity = ENTITY))]
    pub async fn list(
        &self,
        ctx: &AccessContext,
        request: &PageRequest,
        filters: CustomerFilters,
    ) -> Result<PageResult<Customer>, AppError> {
        let predicates = SCOPE.apply(ctx, filters.predicates()?)?;
        record_page_request(ENTITY);

        let mut session = self.db.session().await?;
        Ok(PAGINATOR
            .get_page(&mut session, request, &predicates, Customer::from_row)
            .await?)
    }

    #[instrument(skip_all, fields(entity = ENTITY))]
    pub async fn get(&self, ctx: &AccessContext, id: i64) -> Result<Customer, AppError> {
        let predicates = SCOPE.apply(ctx, by_id(Customer::ID_COLUMN, id))?;

        let mut session = self.db.session().await?;
        PAGINATOR
            .find_one(&mut session, &predicates, Customer::from_row)
            .await?
            .ok_or_else(|| not_found(ENTITY))
    }

    #[instrument(skip_all, fields(entity = ENTITY))]
    pub async fn create(
        &self,
        ctx: &AccessContext,
        customer: NewCustomer,
    ) -> Result<Customer, AppError> {
        SCOPE.authorize_write(ctx)?;

        let query = ComposedQuery {
            sql: "INSERT INTO customers (name, address, phone, package_id) \
                  VALUES ($1, $2, $3, $4) RETURNING id"
                .to_string(),
            params: vec![
                SqlValue::Text(customer.name),
                SqlValue::Text(customer.address),
                SqlValue::Text(customer.phone),
                SqlValue::Int(customer.package_id),
            ],
        };

        let mut session = self.db.session().await?;
        let id = session
            .fetch_id("insert_customer", &query)
            .await
            .map_err(|e| map_write_error(ENTITY, WriteKind::Upsert, e))?
            .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Insert returned no id")))?;

        tracing::info!(entity = ENTITY, "Customer created");
        Self::reload(&mut session, id).await
    }

    #[instrument(skip_all, fields(entity = ENTITY))]
    pub async fn update(
        &self,
        ctx: &AccessContext,
        id: i64,
        customer: NewCustomer,
    ) -> Result<Customer, AppError> {
        SCOPE.authorize_write(ctx)?;

        let query = ComposedQuery {
            sql: "UPDATE customers SET name = $1, address = $2, phone = $3, package_id = $4, \
                  updated_at = NOW() WHERE id = $5 RETURNING id"
                .to_string(),
            params: vec![
                SqlValue::Text(customer.name),
                SqlValue::Text(customer.address),
                SqlValue::Text(customer.phone),
                SqlValue::Int(customer.package_id),
                SqlValue::Int(id),
            ],
        };

        let mut session = self.db.session().await?;
        session
            .fetch_id("update_customer", &query)
            .await
            .map_err(|e| map_write_error(ENTITY, WriteKind::Upsert, e))?
            .ok_or_else(|| not_found(ENTITY))?;

        Self::reload(&mut session, id).await
    }

    #[instrument(skip_all, fields(entity = ENTITY))]
    pub async fn delete(&self, ctx: &AccessContext, id: i64) -> Result<(), AppError> {
        SCOPE.authorize_write(ctx)?;

        let query = ComposedQuery {
            sql: "DELETE FROM customers WHERE id = $1".to_string(),
            params: vec![SqlValue::Int(id)],
        };

        let mut session = self.db.session().await?;
        let affected = session
            .execute("delete_customer", &query)
            .await
            .map_err(|e| map_write_error(ENTITY, WriteKind::Delete, e))?;

        if affected == 0 {
            return Err(not_found(ENTITY));
        }
        Ok(())
    }

    async fn reload(session: &mut PgSession, id: i64) -> Result<Customer, AppError> {
        PAGINATOR
            .find_one(session, &by_id(Customer::ID_COLUMN, id), Customer::from_row)
            .await?
            .ok_or_else(|| not_found(ENTITY))
    }
}
