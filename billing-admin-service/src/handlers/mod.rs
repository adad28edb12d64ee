//! HTTP handlers for billing-admin-service.

pub mod customers;
pub mod extract;
pub mod invoices;
pub mod packages;
