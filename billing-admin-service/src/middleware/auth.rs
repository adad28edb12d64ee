use crate::services::access_scope::AccessContext;
use crate::startup::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

/// Middleware to require a bearer token and attach the caller's `AccessContext`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

    let claims = state.verifier.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Token rejected");
        e
    })?;

    // An undecodable customer id leaves the caller without a scope.
    let scope_id = claims
        .customer_id
        .as_deref()
        .and_then(|opaque| state.codec.decode(opaque));

    req.extensions_mut().insert(AccessContext {
        subject: claims.sub,
        role: claims.role,
        scope_id,
    });

    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AccessContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AccessContext>().cloned().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Access context missing from request extensions"
            ))
        })
    }
}
