use crate::auth::JwtConfig;
use crate::catalog::guard::GuardConfig;
use crate::core::ServerError;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HTTP_HOST | 0.0.0.0 | bind address |
/// | HTTP_PORT | 3000 | HTTP port |
/// | DATABASE_PATH | ./data/catalog.db | SQLite file (`:memory:` allowed) |
/// | ENVIRONMENT | development | development / production |
/// | LOG_LEVEL | info | default log filter (`RUST_LOG` wins) |
/// | LOG_JSON | false | JSON console output |
/// | LOG_DIR | unset | daily rolling log files |
/// | JWT_SECRET | random in debug builds | signing key, >= 32 chars |
/// | JWT_EXPIRATION_MINUTES | 60 | token lifetime |
/// | JWT_ISSUER / JWT_AUDIENCE | catalog-server / catalog-clients | token claims |
/// | DUPLICATE_CASE_SENSITIVE | false | duplicate detection option |
/// | DUPLICATE_TRIM_WHITESPACE | true | duplicate detection option |
#[derive(Debug, Clone)]
pub struct Config {
    pub http_host: String,
    pub http_port: u16,
    pub database_path: String,
    /// development | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    pub jwt: JwtConfig,
    pub duplicate_case_sensitive: bool,
    pub duplicate_trim_whitespace: bool,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables, with defaults
    pub fn from_env() -> Result<Self, ServerError> {
        let jwt = JwtConfig::from_env().map_err(|e| ServerError::Config(e.to_string()))?;
        Ok(Self {
            http_host: env_or("HTTP_HOST", "0.0.0.0"),
            http_port: env_parse("HTTP_PORT", 3000),
            database_path: env_or("DATABASE_PATH", "./data/catalog.db"),
            environment: env_or("ENVIRONMENT", "development"),
            log_level: env_or("LOG_LEVEL", "info"),
            log_json: env_parse("LOG_JSON", false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty()),
            jwt,
            duplicate_case_sensitive: env_parse("DUPLICATE_CASE_SENSITIVE", false),
            duplicate_trim_whitespace: env_parse("DUPLICATE_TRIM_WHITESPACE", true),
        })
    }

    /// In-memory database and an ephemeral JWT secret
    ///
    /// Used by tests
    pub fn for_testing() -> Result<Self, ServerError> {
        Ok(Self {
            http_host: "127.0.0.1".into(),
            http_port: 0,
            database_path: ":memory:".into(),
            environment: "test".into(),
            log_level: "debug".into(),
            log_json: false,
            log_dir: None,
            jwt: JwtConfig::ephemeral().map_err(|e| ServerError::Config(e.to_string()))?,
            duplicate_case_sensitive: false,
            duplicate_trim_whitespace: true,
        })
    }

    pub fn guard_config(&self) -> GuardConfig {
        GuardConfig {
            case_sensitive: self.duplicate_case_sensitive,
            trim_whitespace: self.duplicate_trim_whitespace,
            ..GuardConfig::default()
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
