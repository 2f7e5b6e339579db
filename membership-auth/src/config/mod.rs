use secrecy::{ExposeSecret, SecretString};
use service_core::config as core_config;
use service_core::error::AppError;
use service_core::observability::LogFormat;
use std::env;
use std::str::FromStr;

/// Shortest signing secret accepted in production.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

#[derive(Debug)]
pub struct AuthConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub log_format: LogFormat,
    pub storage: StorageBackend,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
    /// How often stale reset tokens are purged.
    pub reset_token_purge_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

/// Where users, officers and reset tokens live.
#[derive(Debug)]
pub enum StorageBackend {
    Postgres(DatabaseConfig),
    /// Process-local maps; everything is lost on restart. Dev only.
    Memory,
}

#[derive(Debug)]
pub struct DatabaseConfig {
    pub url: SecretString,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug)]
pub struct JwtConfig {
    /// HS256 signing secret.
    pub secret: SecretString,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
    pub register_attempts: u32,
    pub register_window_seconds: u64,
    pub password_reset_attempts: u32,
    pub password_reset_window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_attempts: 5,
            login_window_seconds: 900,
            register_attempts: 3,
            register_window_seconds: 3600,
            password_reset_attempts: 3,
            password_reset_window_seconds: 3600,
        }
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let environment: Environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let is_prod = environment == Environment::Prod;

        let storage = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => StorageBackend::Postgres(DatabaseConfig {
                url: SecretString::new(url),
                max_connections: get_parsed("DATABASE_MAX_CONNECTIONS", "10", is_prod)?,
                min_connections: get_parsed("DATABASE_MIN_CONNECTIONS", "1", is_prod)?,
                acquire_timeout_secs: get_parsed("DATABASE_ACQUIRE_TIMEOUT_SECONDS", "30", is_prod)?,
            }),
            _ if is_prod => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "DATABASE_URL is required in production but not set"
                )))
            }
            _ => StorageBackend::Memory,
        };

        let defaults = RateLimitConfig::default();
        let config = AuthConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("membership-auth"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            log_format: match get_env("LOG_FORMAT", Some(if is_prod { "json" } else { "pretty" }), is_prod)?
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                other => {
                    return Err(AppError::ConfigError(anyhow::anyhow!(
                        "Invalid LOG_FORMAT: {}",
                        other
                    )))
                }
            },
            storage,
            jwt: JwtConfig {
                // no default: an unset secret must never fall back to a known value
                secret: SecretString::new(get_env("JWT_SECRET", None, is_prod)?),
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            rate_limit: RateLimitConfig {
                login_attempts: get_parsed(
                    "RATE_LIMIT_LOGIN_ATTEMPTS",
                    &defaults.login_attempts.to_string(),
                    is_prod,
                )?,
                login_window_seconds: get_parsed(
                    "RATE_LIMIT_LOGIN_WINDOW_SECONDS",
                    &defaults.login_window_seconds.to_string(),
                    is_prod,
                )?,
                register_attempts: get_parsed(
                    "RATE_LIMIT_REGISTER_ATTEMPTS",
                    &defaults.register_attempts.to_string(),
                    is_prod,
                )?,
                register_window_seconds: get_parsed(
                    "RATE_LIMIT_REGISTER_WINDOW_SECONDS",
                    &defaults.register_window_seconds.to_string(),
                    is_prod,
                )?,
                password_reset_attempts: get_parsed(
                    "RATE_LIMIT_PASSWORD_RESET_ATTEMPTS",
                    &defaults.password_reset_attempts.to_string(),
                    is_prod,
                )?,
                password_reset_window_seconds: get_parsed(
                    "RATE_LIMIT_PASSWORD_RESET_WINDOW_SECONDS",
                    &defaults.password_reset_window_seconds.to_string(),
                    is_prod,
                )?,
            },
            reset_token_purge_interval_secs: get_parsed(
                "RESET_TOKEN_PURGE_INTERVAL_SECONDS",
                "3600",
                is_prod,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn is_prod(&self) -> bool {
        self.environment == Environment::Prod
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        let secret_len = self.jwt.secret.expose_secret().len();
        if secret_len == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!("JWT_SECRET must not be empty")));
        }

        if self.reset_token_purge_interval_secs == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "RESET_TOKEN_PURGE_INTERVAL_SECONDS must be positive"
            )));
        }

        if self.is_prod() {
            if secret_len < MIN_JWT_SECRET_BYTES {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "JWT_SECRET must be at least {} bytes in production",
                    MIN_JWT_SECRET_BYTES
                )));
            }

            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if matches!(self.storage, StorageBackend::Memory) {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "In-memory storage is not allowed in production"
                )));
            }
        } else if secret_len < MIN_JWT_SECRET_BYTES {
            tracing::warn!(
                "JWT_SECRET is shorter than {} bytes; this would be rejected in production",
                MIN_JWT_SECRET_BYTES
            );
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn get_parsed<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .trim()
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("Invalid {}: {}", key, e)))
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
