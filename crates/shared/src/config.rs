//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Attachment storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Cross-origin configuration.
    #[serde(default)]
    pub cors: CorsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for handling a single request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_body_limit() -> usize {
    32 * 1024 * 1024
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL. `memory://` selects the in-process store.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Timeout for establishing or acquiring a connection, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Apply pending migrations on start-up.
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    /// Returns true when the URL selects the in-process store.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with("memory:")
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    10
}

/// Attachment storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Root directory for uploaded files and materialized signatures.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Maximum upload size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Base URL under which stored files are publicly reachable.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// MIME types accepted for uploads. Empty means the built-in image list.
    #[serde(default)]
    pub allowed_mime_types: Vec<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_file_size: default_max_file_size(),
            public_base_url: None,
            allowed_mime_types: Vec::new(),
        }
    }
}

fn default_storage_root() -> String {
    "./uploads".to_string()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

/// Cross-origin configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API. `*` allows any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl CorsConfig {
    /// Returns true when any origin is accepted.
    #[must_use]
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Default `tracing` filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default = "default_log_json")]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: default_log_json(),
        }
    }
}

fn default_log_filter() -> String {
    "claimdesk=info,tower_http=info".to_string()
}

fn default_log_json() -> bool {
    true
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, lowest precedence first: `config/default`, `config/{RUN_MODE}`,
    /// `CLAIMDESK__*` environment variables, then the plain `PORT` and
    /// `DATABASE_URL` variables used by most hosting platforms.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("CLAIMDESK")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("storage.allowed_mime_types")
                    .try_parsing(true),
            )
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN_ENV: [(&str, Option<&str>); 3] = [
        ("PORT", None),
        ("DATABASE_URL", None),
        ("RUN_MODE", Some("test-no-such-file")),
    ];

    #[test]
    fn test_load_with_defaults() {
        let mut vars = CLEAN_ENV.to_vec();
        vars.push(("CLAIMDESK__DATABASE__URL", Some("postgres://localhost/claims")));

        temp_env::with_vars(vars, || {
            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.database.url, "postgres://localhost/claims");
            assert_eq!(config.server.port, 5000);
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.storage.max_file_size, 10 * 1024 * 1024);
            assert!(config.cors.allows_any_origin());
            assert!(config.log.json);
            assert!(!config.database.run_migrations);
            assert!(!config.database.is_in_memory());
        });
    }

    #[test]
    fn test_plain_port_and_database_url_override() {
        let vars = vec![
            ("RUN_MODE", Some("test-no-such-file")),
            ("CLAIMDESK__DATABASE__URL", Some("postgres://ignored/db")),
            ("CLAIMDESK__SERVER__PORT", Some("8080")),
            ("DATABASE_URL", Some("memory://")),
            ("PORT", Some("9000")),
        ];

        temp_env::with_vars(vars, || {
            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.server.port, 9000);
            assert!(config.database.is_in_memory());
        });
    }

    #[test]
    fn test_cors_origins_from_list() {
        let mut vars = CLEAN_ENV.to_vec();
        vars.push(("CLAIMDESK__DATABASE__URL", Some("memory://")));
        vars.push((
            "CLAIMDESK__CORS__ALLOWED_ORIGINS",
            Some("https://claims.example.com,https://admin.example.com"),
        ));

        temp_env::with_vars(vars, || {
            let config = AppConfig::load().expect("config should load");
            assert_eq!(
                config.cors.allowed_origins,
                vec!["https://claims.example.com", "https://admin.example.com"]
            );
            assert!(!config.cors.allows_any_origin());
        });
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(CLEAN_ENV.to_vec(), || {
            temp_env::with_var_unset("CLAIMDESK__DATABASE__URL", || {
                assert!(AppConfig::load().is_err());
            });
        });
    }
}
