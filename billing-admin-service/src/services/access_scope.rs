//! Row-level visibility per caller role.
//!
//! The scope is applied to a `PredicateSet` before it reaches the paginator.
//! For a scoped caller, any caller predicate on the scope column is thrown away
//! and an enforced equality on the bound scope id takes its place.

use crate::services::metrics::record_access_denied;
use crate::services::query::{FilterPredicate, Operator, PredicateSet, SqlValue};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

/// Authenticated caller, as established by the token verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessContext {
    pub subject: String,
    pub role: Role,
    /// Customer the caller is bound to, if any.
    pub scope_id: Option<i64>,
}

impl AccessContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    AdminOnly,
    /// Non-admins only see rows whose `column` equals their scope id.
    Scoped { column: &'static str },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("account is not linked to a customer")]
    NotEntitled,

    #[error("admin access required")]
    AdminOnly,
}

impl AccessError {
    fn reason(&self) -> &'static str {
        match self {
            AccessError::NotEntitled => "not_entitled",
            AccessError::AdminOnly => "admin_only",
        }
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        AppError::Forbidden(anyhow::Error::new(err))
    }
}

/// Access rules for one resource.
#[derive(Debug, Clone, Copy)]
pub struct AccessScope {
    entity: &'static str,
    policy: AccessPolicy,
}

impl AccessScope {
    pub const fn admin_only(entity: &'static str) -> Self {
        Self {
            entity,
            policy: AccessPolicy::AdminOnly,
        }
    }

    pub const fn scoped(entity: &'static str, column: &'static str) -> Self {
        Self {
            entity,
            policy: AccessPolicy::Scoped { column },
        }
    }

    /// Rewrite `predicates` so they can only reach rows `ctx` may see.
    pub fn apply(
        &self,
        ctx: &AccessContext,
        mut predicates: PredicateSet,
    ) -> Result<PredicateSet, AccessError> {
        if ctx.is_admin() {
            return Ok(predicates);
        }

        match self.policy {
            AccessPolicy::AdminOnly => Err(self.deny(ctx, AccessError::AdminOnly)),
            AccessPolicy::Scoped { column } => {
                let scope_id = ctx
                    .scope_id
                    .ok_or_else(|| self.deny(ctx, AccessError::NotEntitled))?;

                predicates.discard_caller_column(column);
                predicates.enforce(FilterPredicate::on_column(
                    column,
                    Operator::Eq,
                    SqlValue::Int(scope_id).into(),
                ));

                Ok(predicates)
            }
        }
    }

    /// Writes are reserved to admins on every resource.
    pub fn authorize_write(&self, ctx: &AccessContext) -> Result<(), AccessError> {
        if ctx.is_admin() {
            Ok(())
        } else {
            Err(self.deny(ctx, AccessError::AdminOnly))
        }
    }

    fn deny(&self, ctx: &AccessContext, err: AccessError) -> AccessError {
        tracing::warn!(
            entity = self.entity,
            subject = %ctx.subject,
            reason = err.reason(),
            "Access denied"
        );
        record_access_denied(self.entity, err.reason());
        err
    }
}
