//! Server configuration from environment variables.
//!
//!   CRM_DATABASE_URL        Postgres URL (falls back to DATABASE_URL)
//!   CRM_BIND_ADDR           listen address (default: 0.0.0.0:8080)
//!   CRM_DB_MAX_CONNECTIONS  pool size (default: 10)
//!   CRM_CORS_ORIGINS        comma-separated allowed origins
//!   CRM_STORE               `postgres` (default) or `memory`
//!   CRM_RUN_MIGRATIONS      apply the baseline schema at start-up (default: true)

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost:5432/crm";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://localhost:5174"];

#[derive(Debug, Error)]
#[error("invalid {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub cors_origins: Vec<HeaderValue>,
    pub store: StoreBackend,
    pub run_migrations: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("CRM_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let bind_raw = lookup("CRM_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|e| ConfigError {
            var: "CRM_BIND_ADDR",
            reason: format!("'{bind_raw}': {e}"),
        })?;

        let max_connections = match lookup("CRM_DB_MAX_CONNECTIONS") {
            None => 10,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError {
                        var: "CRM_DB_MAX_CONNECTIONS",
                        reason: format!("'{raw}' is not a positive integer"),
                    })
                }
            },
        };

        let cors_origins = match lookup("CRM_CORS_ORIGINS") {
            None => DEFAULT_CORS_ORIGINS
                .iter()
                .map(|o| HeaderValue::from_static(o))
                .collect(),
            Some(raw) => parse_origins(&raw)?,
        };

        let store = match lookup("CRM_STORE").as_deref().map(str::trim) {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError {
                    var: "CRM_STORE",
                    reason: format!("'{other}' (expected postgres or memory)"),
                })
            }
        };

        let run_migrations = match lookup("CRM_RUN_MIGRATIONS") {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError {
                var: "CRM_RUN_MIGRATIONS",
                reason: format!("'{raw}' is not a boolean"),
            })?,
        };

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            cors_origins,
            store,
            run_migrations,
        })
    }
}

fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| {
            HeaderValue::from_str(o).map_err(|e| ConfigError {
                var: "CRM_CORS_ORIGINS",
                reason: format!("'{o}': {e}"),
            })
        })
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.max_connections, 10);
        assert_eq!(cfg.store, StoreBackend::Postgres);
        assert!(cfg.run_migrations);
        assert_eq!(cfg.cors_origins.len(), 2);
        assert_eq!(cfg.cors_origins[0], "http://localhost:5173");
    }

    #[test]
    fn crm_database_url_wins_over_database_url() {
        let cfg = config(&[
            ("DATABASE_URL", "postgresql:///fallback"),
            ("CRM_DATABASE_URL", "postgresql:///primary"),
        ])
        .unwrap();
        assert_eq!(cfg.database_url, "postgresql:///primary");

        let cfg = config(&[("DATABASE_URL", "postgresql:///fallback")]).unwrap();
        assert_eq!(cfg.database_url, "postgresql:///fallback");
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("CRM_BIND_ADDR", "127.0.0.1:9000"),
            ("CRM_DB_MAX_CONNECTIONS", "4"),
            ("CRM_CORS_ORIGINS", "https://crm.example.com, http://localhost:3000"),
            ("CRM_STORE", "memory"),
            ("CRM_RUN_MIGRATIONS", "false"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(cfg.max_connections, 4);
        assert_eq!(cfg.cors_origins.len(), 2);
        assert_eq!(cfg.cors_origins[1], "http://localhost:3000");
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert!(!cfg.run_migrations);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = config(&[("CRM_BIND_ADDR", "nowhere")]).unwrap_err();
        assert_eq!(err.var, "CRM_BIND_ADDR");

        let err = config(&[("CRM_DB_MAX_CONNECTIONS", "0")]).unwrap_err();
        assert_eq!(err.var, "CRM_DB_MAX_CONNECTIONS");

        let err = config(&[("CRM_STORE", "redis")]).unwrap_err();
        assert_eq!(err.var, "CRM_STORE");

        let err = config(&[("CRM_RUN_MIGRATIONS", "maybe")]).unwrap_err();
        assert!(err.to_string().starts_with("invalid CRM_RUN_MIGRATIONS"));
    }
}
