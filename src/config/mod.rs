//! Configuration layer: typed settings with layered precedence (file → env).

use std::{num::NonZeroU32, str::FromStr};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheConfig;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "kudos";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;

/// Fully validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment).
pub fn load() -> Result<Settings, LoadError> {
    let builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false))
        .add_source(Environment::with_prefix("KUDOS").separator("__"));

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    Settings::from_raw(raw)
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            database,
            cache,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cache: build_cache_config(cache)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    status_ttl_secs: Option<u64>,
    count_ttl_secs: Option<u64>,
    status_limit: Option<usize>,
    count_limit: Option<usize>,
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let value = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let max_connections = NonZeroU32::new(value)
        .ok_or_else(|| LoadError::invalid("database.max_connections", "must be greater than zero"))?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_cache_config(cache: RawCacheSettings) -> Result<CacheConfig, LoadError> {
    let defaults = CacheConfig::default();
    let built = CacheConfig {
        enabled: cache.enabled.unwrap_or(defaults.enabled),
        status_ttl_secs: cache.status_ttl_secs.unwrap_or(defaults.status_ttl_secs),
        count_ttl_secs: cache.count_ttl_secs.unwrap_or(defaults.count_ttl_secs),
        status_limit: cache.status_limit.unwrap_or(defaults.status_limit),
        count_limit: cache.count_limit.unwrap_or(defaults.count_limit),
    };

    if built.enabled {
        if built.status_ttl_secs == 0 {
            return Err(LoadError::invalid(
                "cache.status_ttl_secs",
                "must be greater than zero when the cache is enabled",
            ));
        }
        if built.count_ttl_secs == 0 {
            return Err(LoadError::invalid(
                "cache.count_ttl_secs",
                "must be greater than zero when the cache is enabled",
            ));
        }
        if built.status_limit == 0 {
            return Err(LoadError::invalid(
                "cache.status_limit",
                "must be greater than zero when the cache is enabled",
            ));
        }
        if built.count_limit == 0 {
            return Err(LoadError::invalid(
                "cache.count_limit",
                "must be greater than zero when the cache is enabled",
            ));
        }
    }

    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_defaults_to_info_compact() {
        let logging = build_logging_settings(RawLoggingSettings::default())
            .unwrap_or_else(|err| panic!("default logging settings must build: {err}"));
        assert_eq!(logging.level, LevelFilter::INFO);
        assert!(matches!(logging.format, LogFormat::Compact));
    }

    #[test]
    fn logging_rejects_unknown_level() {
        let raw = RawLoggingSettings {
            level: Some("chatty".into()),
            json: None,
        };
        let err = build_logging_settings(raw).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "logging.level",
                ..
            }
        ));
    }

    #[test]
    fn database_blank_url_is_treated_as_absent() {
        let raw = RawDatabaseSettings {
            url: Some("   ".into()),
            max_connections: None,
        };
        let database = build_database_settings(raw)
            .unwrap_or_else(|err| panic!("settings must build: {err}"));
        assert!(database.url.is_none());
        assert_eq!(database.max_connections.get(), DEFAULT_DB_MAX_CONNECTIONS);
    }

    #[test]
    fn database_rejects_zero_connections() {
        let raw = RawDatabaseSettings {
            url: None,
            max_connections: Some(0),
        };
        assert!(build_database_settings(raw).is_err());
    }

    #[test]
    fn cache_defaults_apply() {
        let cache = build_cache_config(RawCacheSettings::default())
            .unwrap_or_else(|err| panic!("default cache settings must build: {err}"));
        let defaults = CacheConfig::default();
        assert_eq!(cache.enabled, defaults.enabled);
        assert_eq!(cache.status_ttl_secs, defaults.status_ttl_secs);
        assert_eq!(cache.count_limit, defaults.count_limit);
    }

    #[test]
    fn cache_rejects_zero_ttl_when_enabled() {
        let raw = RawCacheSettings {
            enabled: Some(true),
            status_ttl_secs: Some(0),
            ..RawCacheSettings::default()
        };
        let err = build_cache_config(raw).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "cache.status_ttl_secs",
                ..
            }
        ));
    }

    #[test]
    fn cache_allows_zero_ttl_when_disabled() {
        let raw = RawCacheSettings {
            enabled: Some(false),
            count_ttl_secs: Some(0),
            ..RawCacheSettings::default()
        };
        let cache = build_cache_config(raw)
            .unwrap_or_else(|err| panic!("disabled cache settings must build: {err}"));
        assert!(!cache.enabled);
    }
}
