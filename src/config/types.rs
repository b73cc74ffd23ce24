//! Settings consumed by the server binary and the assembly function.

use crate::service::{OversizePolicy, PageLimits};
use std::net::SocketAddr;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 64 * 1024;

#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    /// Absent only for in-memory setups; the server requires it.
    pub url: Option<String>,
    pub max_connections: u32,
    pub schema: String,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub bind_addr: SocketAddr,
    pub page: PageLimits,
    pub body_limit_bytes: usize,
}

impl Settings {
    /// URL of the database, or `ConfigError::Missing` when unset.
    pub fn database_url(&self) -> Result<&str, crate::error::ConfigError> {
        self.database
            .url
            .as_deref()
            .ok_or(crate::error::ConfigError::Missing("DATABASE_URL"))
    }
}

impl OversizePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "clamp" => Some(OversizePolicy::Clamp),
            "reject" => Some(OversizePolicy::Reject),
            _ => None,
        }
    }
}
