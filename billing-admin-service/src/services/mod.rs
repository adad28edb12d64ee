//! Services module for billing-admin-service.

pub mod access_scope;
pub mod database;
pub mod identifiers;
pub mod metrics;
pub mod query;
pub mod repository;
pub mod token;

pub use access_scope::{AccessContext, AccessScope, Role};
pub use database::{Database, PgSession};
pub use identifiers::IdentifierCodec;
pub use metrics::{get_metrics, init_metrics, record_access_denied, record_page_request};
pub use repository::{CustomerRepository, InvoiceRepository, PackageRepository};
pub use token::{Claims, JwtVerifier, TokenVerifier};
