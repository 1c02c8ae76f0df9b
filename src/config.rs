//! Application configuration loaded from environment variables.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

/// Application configuration loaded from environment variables.
#[derive(Clone, Deserialize)]
pub struct Config {
    // === Store Connection ===
    /// PostgreSQL host.
    #[serde(default = "default_db_host")]
    pub db_host: String,

    /// PostgreSQL port.
    #[serde(default = "default_db_port")]
    pub db_port: u16,

    /// Database name.
    #[serde(default = "default_db_name")]
    pub db_name: String,

    /// Database user.
    #[serde(default = "default_db_user")]
    pub db_user: String,

    /// Database password. Never logged.
    #[serde(default = "default_db_password")]
    pub db_password: String,

    // === Pool ===
    /// Upper bound on open connections.
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    /// Seconds to wait for a free connection before failing a request.
    #[serde(default = "default_acquire_timeout")]
    pub db_acquire_timeout_secs: u64,

    // === Server Configuration ===
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "backdb".to_string()
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_password() -> String {
    "postgres".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.db_host.is_empty() {
            return Err("DB_HOST must not be empty".to_string());
        }

        if self.db_name.is_empty() {
            return Err("DB_NAME must not be empty".to_string());
        }

        if self.port == 0 {
            return Err("PORT must be greater than 0".to_string());
        }

        if self.db_max_connections == 0 {
            return Err("DB_MAX_CONNECTIONS must be at least 1".to_string());
        }

        Ok(())
    }

    /// Connection options for the PostgreSQL pool.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .database(&self.db_name)
            .username(&self.db_user)
            .password(&self.db_password)
    }

    /// Pool acquire timeout.
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }

    /// Password placeholder suitable for logs.
    pub fn password_status(&self) -> &'static str {
        if self.db_password.is_empty() {
            "not configured"
        } else {
            "***configured***"
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("db_password", &self.password_status())
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .field("log_json", &self.log_json)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        envy::from_iter(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
        .unwrap()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = from_pairs(&[]);

        assert_eq!(config.db_host, "localhost");
        assert_eq!(config.db_port, 5432);
        assert_eq!(config.db_name, "backdb");
        assert_eq!(config.db_user, "postgres");
        assert_eq!(config.db_password, "postgres");
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.db_acquire_timeout_secs, 5);
        assert!(!config.log_json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = from_pairs(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("DB_NAME", "people"),
            ("PORT", "8081"),
        ]);

        assert_eq!(config.db_host, "db.internal");
        assert_eq!(config.db_port, 6543);
        assert_eq!(config.db_name, "people");
        assert_eq!(config.port, 8081);
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let result: Result<Config, _> =
            envy::from_iter(vec![("DB_PORT".to_string(), "five".to_string())]);
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_zero_port() {
        let mut config = from_pairs(&[]);
        config.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_database_name() {
        let config = from_pairs(&[("DB_NAME", "")]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_pool_size() {
        let config = from_pairs(&[("DB_MAX_CONNECTIONS", "0")]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_hides_password() {
        let config = from_pairs(&[("DB_PASSWORD", "hunter2")]);
        let rendered = format!("{:?}", config);

        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***configured***"));
    }

    #[test]
    fn empty_password_reports_not_configured() {
        let config = from_pairs(&[("DB_PASSWORD", "")]);
        assert_eq!(config.password_status(), "not configured");
    }
}
