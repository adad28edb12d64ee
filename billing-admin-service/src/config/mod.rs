//! Configuration module for billing-admin-service.

use crate::services::identifiers::{IdentifierCodec, DEFAULT_ALPHABET};
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct BillingAdminConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub identifiers: IdentifierConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct IdentifierConfig {
    pub alphabet: String,
    pub min_length: usize,
    pub blocklist: Vec<String>,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_ALPHABET.to_string(),
            min_length: 8,
            blocklist: Vec::new(),
        }
    }
}

impl IdentifierConfig {
    /// Build the codec, turning a bad alphabet or length into a startup failure.
    pub fn codec(&self) -> Result<IdentifierCodec, AppError> {
        IdentifierCodec::new(&self.alphabet, self.min_length, &self.blocklist).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid identifier settings: {}", e))
        })
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
}

impl BillingAdminConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let config = Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "billing-admin-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10),
                min_connections: parse_or("DATABASE_MIN_CONNECTIONS", 2),
                acquire_timeout_secs: parse_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 30),
            },
            identifiers: IdentifierConfig {
                alphabet: env::var("IDENTIFIER_ALPHABET")
                    .unwrap_or_else(|_| DEFAULT_ALPHABET.to_string()),
                min_length: parse_or("IDENTIFIER_MIN_LENGTH", 8),
                blocklist: env::var("IDENTIFIER_BLOCKLIST")
                    .map(|s| parse_list(&s))
                    .unwrap_or_default(),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET").map(Secret::new).map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("JWT_SECRET is required"))
                })?,
            },
        };

        config.identifiers.codec()?;
        Ok(config)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
