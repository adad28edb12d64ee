use super::{by_id, map_write_error, not_found, WriteKind};
use crate::models::{NewPackage, Package, PackageFilters};
use crate::services::access_scope::{AccessContext, AccessScope};
use crate::services::database::Database;
use crate::services::metrics::record_page_request;
use crate::services::query::{ComposedQuery, PageRequest, PageResult, Paginator, SqlValue};
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;

const ENTITY: &str = "package";
const SCOPE: AccessScope = AccessScope::admin_only(ENTITY);
const PAGINATOR: Paginator = Paginator::new(Package::TEMPLATE);

#[derive(Clone)]
pub struct PackageRepository {
    db: Arc<Database>,
}

impl PackageRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    #[instrument(skip_all, fields(entity = ENTITY))]
    pub async fn list(
        &self,
        ctx: &AccessContext,
        request: &PageRequest,
        filters: PackageFilters,
    ) -> Result<PageResult<Package>, AppError> {
        let predicates = SCOPE.apply(ctx, filters.predicates()?)?;
        record_page_request(ENTITY);

        let mut session = self.db.session().await?;
        Ok(PAGINATOR
            .get_page(&mut session, request, &predicates, Package::from_row)
            .await?)
    }

    #[instrument(skip_all, fields(entity = ENTITY))]
    pub async fn get(&self, ctx: &AccessContext, id: i64) -> Result<Package, AppError> {
        let predicates = SCOPE.apply(ctx, by_id(Package::ID_COLUMN, id))?;

        let mut session = self.db.session().await?;
        PAGINATOR
            .find_one(&mut session, &predicates, Package::from_row)
            .await?
            .ok_or_else(|| not_found(ENTITY))
    }

    #[instrument(skip_all, fields(entity = ENTITY))]
    pub async fn create(&self, ctx: &AccessContext, package: NewPackage) -> Result<Package, AppError> {
        SCOPE.authorize_write(ctx)?;

        let query = ComposedQuery {
            sql: "INSERT INTO packages (name, price, speed) VALUES ($1, $2, $3) RETURNING id"
                .to_string(),
            params: vec![
                SqlValue::Text(package.name),
                SqlValue::Int(package.price),
                SqlValue::Text(package.speed),
            ],
        };

        let mut session = self.db.session().await?;
        let id = session
            .fetch_id("insert_package", &query)
            .await
            .map_err(|e| map_write_error(ENTITY, WriteKind::Upsert, e))?
            .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Insert returned no id")))?;

        tracing::info!(entity = ENTITY, "Package created");

        PAGINATOR
            .find_one(&mut session, &by_id(Package::ID_COLUMN, id), Package::from_row)
            .await?
            .ok_or_else(|| not_found(ENTITY))
    }

    #[instrument(skip_all, fields(entity = ENTITY))]
    pub async fn update(
        &self,
        ctx: &AccessContext,
        id: i64,
        package: NewPackage,
    ) -> Result<Package, AppError> {
        SCOPE.authorize_write(ctx)?;

        let query = ComposedQuery {
            sql: "UPDATE packages SET name = $1, price = $2, speed = $3, updated_at = NOW() \
                  WHERE id = $4 RETURNING id"
                .to_string(),
            params: vec![
                SqlValue::Text(package.name),
                SqlValue::Int(package.price),
                SqlValue::Text(package.speed),
                SqlValue::Int(id),
            ],
        };

        let mut session = self.db.session().await?;
        session
            .fetch_id("update_package", &query)
            .await
            .map_err(|e| map_write_error(ENTITY, WriteKind::Upsert, e))?
            .ok_or_else(|| not_found(ENTITY))?;

        PAGINATOR
            .find_one(&mut session, &by_id(Package::ID_COLUMN, id), Package::from_row)
            .await?
            .ok_or_else(|| not_found(ENTITY))
    }

    #[instrument(skip_all, fields(entity = ENTITY))]
    pub async fn delete(&self, ctx: &AccessContext, id: i64) -> Result<(), AppError> {
        SCOPE.authorize_write(ctx)?;

        let query = ComposedQuery {
            sql: "DELETE FROM packages WHERE id = $1".to_string(),
            params: vec![SqlValue::Int(id)],
        };

        let mut session = self.db.session().await?;
        let affected = session
            .execute("delete_package", &query)
            .await
            .map_err(|e| map_write_error(ENTITY, WriteKind::Delete, e))?;

        if affected == 0 {
            return Err(not_found(ENTITY));
        }
        Ok(())
    }
}
