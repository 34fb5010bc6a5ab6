//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file loaded by the entry point via `dotenvy`).

use std::net::SocketAddr;
use std::str::FromStr;

use sqlx::postgres::PgConnectOptions;

use crate::error::ConfigError;
use crate::ws::origin::AllowedOrigins;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Path of the WebSocket endpoint.
    pub ws_path: String,

    /// Origins permitted to open a WebSocket session.
    pub allowed_origins: AllowedOrigins,

    /// PostgreSQL connection string.
    pub database_url: String,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Minimum idle connections in the pool.
    pub database_min_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Apply bundled schema migrations at startup.
    pub run_migrations: bool,

    /// Log output format.
    pub log_format: LogFormat,
}

impl GatewayConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`GatewayConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// Numeric pool settings fall back to defaults when missing or invalid;
    /// everything else is validated.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `DATABASE_URL` is missing or not a
    /// PostgreSQL URL, if `LISTEN_ADDR` cannot be parsed, if `WS_PATH` does
    /// not start with `/`, or if `ALLOWED_ORIGINS` yields no origin.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "LISTEN_ADDR",
                reason: e.to_string(),
            })?;

        let ws_path = lookup("WS_PATH").unwrap_or_else(|| "/ws".to_string());
        if !ws_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                key: "WS_PATH",
                reason: format!("path must start with '/': {ws_path}"),
            });
        }
        if ws_path == "/health" {
            return Err(ConfigError::Invalid {
                key: "WS_PATH",
                reason: "'/health' is reserved".to_string(),
            });
        }

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|raw| AllowedOrigins::parse(&raw))
            .unwrap_or_default();
        if allowed_origins.is_empty() {
            return Err(ConfigError::Invalid {
                key: "ALLOWED_ORIGINS",
                reason: "no origins listed".to_string(),
            });
        }

        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        if !(database_url.starts_with("postgres://") || database_url.starts_with("postgresql://")) {
            return Err(ConfigError::Invalid {
                key: "DATABASE_URL",
                reason: "expected a postgres:// or postgresql:// URL".to_string(),
            });
        }
        PgConnectOptions::from_str(&database_url).map_err(|e| ConfigError::Invalid {
            key: "DATABASE_URL",
            reason: e.to_string(),
        })?;

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    reason: format!("expected 'pretty' or 'json', got '{other}'"),
                });
            }
        };

        Ok(Self {
            listen_addr,
            ws_path,
            allowed_origins,
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10),
            database_min_connections: parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", 0),
            database_connect_timeout_secs: parse_or(&lookup, "DATABASE_CONNECT_TIMEOUT_SECS", 5),
            run_migrations: parse_bool_or(&lookup, "DATABASE_RUN_MIGRATIONS", true),
            log_format,
        })
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid values.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Parses a variable as a boolean. Accepts `"true"`, `"1"`, `"false"`, `"0"`
/// (case-insensitive). Returns `default` otherwise.
fn parse_bool_or<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const URL: &str = "postgres://kv:kv@localhost:5432/kv";

    fn load(vars: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        GatewayConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_with_only_database_url() {
        let Ok(cfg) = load(&[("DATABASE_URL", URL)]) else {
            panic!("config should load");
        };
        assert_eq!(cfg.listen_addr.port(), 8080);
        assert_eq!(cfg.ws_path, "/ws");
        assert!(cfg.allowed_origins.is_allowed("http://localhost:3000"));
        assert_eq!(cfg.database_max_connections, 10);
        assert!(cfg.run_migrations);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = load(&[]).err();
        assert!(matches!(err, Some(ConfigError::Missing("DATABASE_URL"))));

        let err = load(&[("DATABASE_URL", "   ")]).err();
        assert!(matches!(err, Some(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn non_postgres_url_is_rejected() {
        let err = load(&[("DATABASE_URL", "mysql://localhost/kv")]).err();
        assert!(matches!(
            err,
            Some(ConfigError::Invalid {
                key: "DATABASE_URL",
                ..
            })
        ));
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let Ok(cfg) = load(&[
            ("DATABASE_URL", URL),
            ("ALLOWED_ORIGINS", " https://a.example , ,https://b.example"),
        ]) else {
            panic!("config should load");
        };
        assert_eq!(cfg.allowed_origins.len(), 2);
        assert!(cfg.allowed_origins.is_allowed("https://b.example"));
        assert!(!cfg.allowed_origins.is_allowed("http://localhost:3000"));
    }

    #[test]
    fn empty_origin_list_is_rejected() {
        let err = load(&[("DATABASE_URL", URL), ("ALLOWED_ORIGINS", " , ")]).err();
        assert!(matches!(
            err,
            Some(ConfigError::Invalid {
                key: "ALLOWED_ORIGINS",
                ..
            })
        ));
    }

    #[test]
    fn ws_path_must_be_absolute() {
        let err = load(&[("DATABASE_URL", URL), ("WS_PATH", "ws")]).err();
        assert!(matches!(err, Some(ConfigError::Invalid { key: "WS_PATH", .. })));

        let err = load(&[("DATABASE_URL", URL), ("WS_PATH", "/health")]).err();
        assert!(matches!(err, Some(ConfigError::Invalid { key: "WS_PATH", .. })));
    }

    #[test]
    fn invalid_numbers_fall_back_and_bools_parse() {
        let Ok(cfg) = load(&[
            ("DATABASE_URL", URL),
            ("DATABASE_MAX_CONNECTIONS", "lots"),
            ("DATABASE_RUN_MIGRATIONS", "FALSE"),
            ("LOG_FORMAT", "json"),
        ]) else {
            panic!("config should load");
        };
        assert_eq!(cfg.database_max_connections, 10);
        assert!(!cfg.run_migrations);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn bad_listen_addr_is_rejected() {
        let err = load(&[("DATABASE_URL", URL), ("LISTEN_ADDR", "localhost")]).err();
        assert!(matches!(
            err,
            Some(ConfigError::Invalid {
                key: "LISTEN_ADDR",
                ..
            })
        ));
    }
}
