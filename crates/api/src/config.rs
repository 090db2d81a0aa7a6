use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL and JWT secret have defaults suitable
/// for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8901`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Timeout for runner result reports and agent metric pushes (default: `10`).
    pub ingest_timeout_secs: u64,
    /// Largest accepted request body in bytes (default: `2097152`).
    pub max_body_bytes: usize,
    /// Grace period for background tasks after the listener closes (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Postgres connection string.
    pub database_url: String,
    /// Pool size (default: `10`).
    pub db_max_connections: u32,
    /// Lifetime of cached tenant settings in seconds (default: `300`).
    pub settings_cache_ttl_secs: u64,
    /// Node metric samples older than this are purged (default: `168`).
    pub metrics_retention_hours: i64,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                    |
    /// |---------------------------|----------------------------|
    /// | `HOST`                    | `0.0.0.0`                  |
    /// | `PORT`                    | `8901`                     |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                       |
    /// | `INGEST_TIMEOUT_SECS`     | `10`                       |
    /// | `MAX_BODY_BYTES`          | `2097152`                  |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `30`                       |
    /// | `DATABASE_URL`            | required                   |
    /// | `DB_MAX_CONNECTIONS`      | `10`                       |
    /// | `SETTINGS_CACHE_TTL_SECS` | `300`                      |
    /// | `METRICS_RETENTION_HOURS` | `168`                      |
    ///
    /// # Panics
    ///
    /// Panics when a variable is present but malformed, or when
    /// `DATABASE_URL` is missing. Misconfiguration should fail at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = parse_var("PORT", "8901");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", "30"),
            ingest_timeout_secs: parse_var("INGEST_TIMEOUT_SECS", "10"),
            max_body_bytes: parse_var("MAX_BODY_BYTES", "2097152"),
            shutdown_timeout_secs: parse_var("SHUTDOWN_TIMEOUT_SECS", "30"),
            database_url,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "10"),
            settings_cache_ttl_secs: parse_var("SETTINGS_CACHE_TTL_SECS", "300"),
            metrics_retention_hours: parse_var("METRICS_RETENTION_HOURS", "168"),
            jwt: JwtConfig::from_env(),
        }
    }
}

fn parse_var<T>(name: &str, default: &str) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .unwrap_or_else(|e| panic!("{name} must be a valid value, got '{raw}': {e}"))
}
