//! Environment-driven API configuration.

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_ORGANIZATION_HEADER: &str = "x-organization-id";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("COACHBOARD_BIND_ADDR is not a socket address: '{0}'")]
    InvalidBindAddr(String),

    #[error("COACHBOARD_ORGANIZATION_HEADER is not a valid header name: '{0}'")]
    InvalidHeaderName(String),

    #[error("JWT_SECRET must not be empty")]
    EmptySecret,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Request header carrying the caller's organization selection.
    pub organization_header: HeaderName,
}

impl ApiConfig {
    /// Defaults with the given signing secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: jwt_secret.into(),
            organization_header: HeaderName::from_static(DEFAULT_ORGANIZATION_HEADER),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = lookup("COACHBOARD_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind.clone()))?;

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if secret.is_empty() => return Err(ConfigError::EmptySecret),
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let header = lookup("COACHBOARD_ORGANIZATION_HEADER")
            .unwrap_or_else(|| DEFAULT_ORGANIZATION_HEADER.to_string());
        let organization_header = HeaderName::try_from(header.to_ascii_lowercase())
            .map_err(|_| ConfigError::InvalidHeaderName(header.clone()))?;

        Ok(Self {
            bind_addr,
            jwt_secret,
            organization_header,
        })
    }
}
