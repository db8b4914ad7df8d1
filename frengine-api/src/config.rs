/// Configuration management for the API server
///
/// Configuration is layered, later sources winning:
///
/// 1. Built-in defaults
/// 2. An optional `config.json` in the working directory
/// 3. `FRENGINE__`-prefixed environment variables, `__` separating sections
/// 4. The conventional `DATABASE_URL` and `JWT_SECRET` variables
///
/// A `.env` file is loaded into the environment first, if present.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `JWT_SECRET`: Secret key for JWT signing, at least 32 bytes (required)
/// - `FRENGINE__API__HOST`: Host to bind to (default: 0.0.0.0)
/// - `FRENGINE__API__PORT`: Port to bind to (default: 8083)
/// - `FRENGINE__API__PRODUCTION`: Enables HSTS (default: false)
/// - `FRENGINE__JWT__TOKEN_TTL_HOURS`: Session lifetime (default: 72)
/// - `RUST_LOG`: Log filter
/// - `LOG_FORMAT`: `json` for JSON log lines
///
/// # Example
///
/// ```no_run
/// use frengine_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::load()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use config::{Environment, File, FileFormat};
use frengine_shared::{auth::jwt::DEFAULT_TTL_HOURS, db::pool};
use serde::{Deserialize, Serialize};
use std::env;

/// Minimum JWT secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime (one year)
pub const MAX_TTL_HOURS: i64 = 24 * 365;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS on)
    pub production: bool,

    /// Upper bound on a single request
    pub request_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8083,
            cors_origins: vec!["*".to_string()],
            production: false,
            request_timeout_seconds: 30,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Minimum number of idle connections
    pub min_connections: u32,

    /// Connection acquire timeout
    pub connect_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let pool = pool::DatabaseConfig::default();
        Self {
            url: String::new(),
            max_connections: pool.max_connections,
            min_connections: pool.min_connections,
            connect_timeout_seconds: pool.connect_timeout_seconds,
        }
    }
}

impl From<&DatabaseConfig> for pool::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_seconds: config.connect_timeout_seconds,
            ..Default::default()
        }
    }
}

/// JWT configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Session token lifetime
    pub token_ttl_hours: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_ttl_hours: DEFAULT_TTL_HOURS,
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

impl Config {
    /// Loads and validates configuration from all sources
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A source holds a value of the wrong type
    /// - `DATABASE_URL` is missing
    /// - The JWT secret is missing or shorter than 32 bytes
    /// - The token lifetime is not between 1 hour and one year
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let config: Config = config::Config::builder()
            .add_source(File::new("config", FileFormat::Json).required(false))
            .add_source(
                Environment::with_prefix("FRENGINE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("api.cors_origins")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("jwt.secret", env::var("JWT_SECRET").ok())?
            .build()?
            .try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// Checks values no type can express
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("DATABASE_URL environment variable is required");
        }

        if self.jwt.secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} bytes long", MIN_SECRET_LEN);
        }

        if self.jwt.token_ttl_hours <= 0 || self.jwt.token_ttl_hours > MAX_TTL_HOURS {
            anyhow::bail!("Token lifetime must be between 1 and {} hours", MAX_TTL_HOURS);
        }

        Ok(())
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
