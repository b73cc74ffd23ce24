//! Settings validation: ranges and identifier syntax.

use crate::config::Settings;
use crate::error::ConfigError;

/// Schema names are interpolated as quoted identifiers, so only plain ones are accepted.
pub fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    s.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if !is_plain_identifier(&settings.database.schema) {
        return Err(ConfigError::Invalid {
            name: "DB_SCHEMA",
            reason: format!("'{}' is not a plain identifier", settings.database.schema),
        });
    }
    if settings.database.max_connections == 0 {
        return Err(ConfigError::Invalid {
            name: "DB_MAX_CONNECTIONS",
            reason: "must be at least 1".into(),
        });
    }
    if settings.page.max_limit == 0 {
        return Err(ConfigError::Invalid {
            name: "PAGE_MAX_LIMIT",
            reason: "must be at least 1".into(),
        });
    }
    if settings.page.default_limit > settings.page.max_limit {
        return Err(ConfigError::Invalid {
            name: "PAGE_DEFAULT_LIMIT",
            reason: format!(
                "{} exceeds PAGE_MAX_LIMIT {}",
                settings.page.default_limit, settings.page.max_limit
            ),
        });
    }
    if settings.body_limit_bytes == 0 {
        return Err(ConfigError::Invalid {
            name: "BODY_LIMIT_BYTES",
            reason: "must be at least 1".into(),
        });
    }
    Ok(())
}
