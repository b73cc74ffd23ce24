//! Load settings from the process environment (after `.env`) or from any lookup function.

use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use crate::service::{OversizePolicy, PageLimits};
use std::str::FromStr;

impl Settings {
    /// Read `.env` if present, then the process environment.
    pub fn from_env() -> Result<Settings, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(ConfigError::Invalid {
                    name: ".env",
                    reason: e.to_string(),
                });
            }
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from `lookup(name) -> value`; unset names take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PageLimits::default();
        let oversize = match lookup("PAGE_OVERSIZE") {
            None => defaults.oversize,
            Some(raw) => OversizePolicy::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                name: "PAGE_OVERSIZE",
                reason: format!("expected clamp or reject, got '{}'", raw),
            })?,
        };
        let settings = Settings {
            database: DatabaseSettings {
                url: lookup("DATABASE_URL").filter(|s| !s.trim().is_empty()),
                max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
                schema: lookup("DB_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
            },
            bind_addr: match lookup("BIND_ADDR") {
                Some(raw) => parse_value("BIND_ADDR", &raw)?,
                None => parse_value("BIND_ADDR", DEFAULT_BIND_ADDR)?,
            },
            page: PageLimits {
                default_limit: parsed(&lookup, "PAGE_DEFAULT_LIMIT", defaults.default_limit)?,
                max_limit: parsed(&lookup, "PAGE_MAX_LIMIT", defaults.max_limit)?,
                oversize,
            },
            body_limit_bytes: parsed(&lookup, "BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES)?,
        };
        validate(&settings)?;
        Ok(settings)
    }
}

fn parsed<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => parse_value(name, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: format!("'{}': {}", raw, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s.database.url, None);
        assert_eq!(s.database.max_connections, 5);
        assert_eq!(s.database.schema, "public");
        assert_eq!(s.bind_addr.port(), 3000);
        assert_eq!(s.page.default_limit, 20);
        assert_eq!(s.page.max_limit, 1000);
        assert_eq!(s.page.oversize, OversizePolicy::Clamp);
        assert_eq!(s.body_limit_bytes, 64 * 1024);
        assert!(matches!(s.database_url(), Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn reads_overrides() {
        let s = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/entities"),
            ("DB_SCHEMA", "app"),
            ("PAGE_MAX_LIMIT", "50"),
            ("PAGE_OVERSIZE", "Reject"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ]))
        .unwrap();
        assert_eq!(s.database_url().unwrap(), "postgres://localhost/entities");
        assert_eq!(s.database.schema, "app");
        assert_eq!(s.page.max_limit, 50);
        assert_eq!(s.page.oversize, OversizePolicy::Reject);
        assert_eq!(s.bind_addr.port(), 8080);
    }

    #[test]
    fn malformed_values_are_named() {
        let err = Settings::from_lookup(lookup(&[("DB_MAX_CONNECTIONS", "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DB_MAX_CONNECTIONS", .. }));
        let err = Settings::from_lookup(lookup(&[("PAGE_OVERSIZE", "truncate")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PAGE_OVERSIZE", .. }));
    }
}
