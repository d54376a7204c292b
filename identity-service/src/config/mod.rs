use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Minimum signing secret length accepted in production.
pub const MIN_PROD_SECRET_BYTES: usize = 32;

/// Longest session lifetime accepted, in days.
pub const MAX_TOKEN_EXPIRY_DAYS: i64 = 3650;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub registration: RegistrationConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// HMAC signing secret; only ever handed to `JwtService::new`.
    pub secret: Secret<String>,
    pub token_expiry_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    pub default_role_name: String,
    pub default_specification: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = AuthConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("identity-service"), false)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), false)?,
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            database: DatabaseConfig {
                url: Secret::new(get_env("DATABASE_URL", None, is_prod)?),
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", "10")?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", "1")?,
                acquire_timeout_seconds: parse_env("DATABASE_ACQUIRE_TIMEOUT_SECONDS", "5")?,
            },
            jwt: JwtConfig {
                secret: Secret::new(get_env("JWT_SECRET", None, is_prod)?),
                token_expiry_days: parse_env("JWT_TOKEN_EXPIRY_DAYS", "30")?,
            },
            registration: RegistrationConfig {
                default_role_name: get_env("DEFAULT_ROLE_NAME", Some("User"), false)?,
                default_specification: get_env("DEFAULT_SPECIFICATION", Some("Frontend"), false)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.common.validate()?;

        if !(1..=MAX_TOKEN_EXPIRY_DAYS).contains(&self.jwt.token_expiry_days) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_TOKEN_EXPIRY_DAYS must be between 1 and {}",
                MAX_TOKEN_EXPIRY_DAYS
            )));
        }

        if self.jwt.secret.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must not be empty"
            )));
        }

        if self
            .registration
            .default_specification
            .parse::<crate::models::Specification>()
            .is_err()
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DEFAULT_SPECIFICATION is not a known specification"
            )));
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.jwt.secret.expose_secret().len() < MIN_PROD_SECRET_BYTES {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "JWT_SECRET must be at least {} bytes in production",
                    MIN_PROD_SECRET_BYTES
                )));
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

/// Numeric knobs keep their defaults even in production.
fn parse_env<T>(key: &str, default: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), false)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(environment: Environment, secret: &str) -> AuthConfig {
        AuthConfig {
            common: core_config::Config {
                port: 8080,
                request_timeout_seconds: 10,
            },
            environment,
            service_name: "identity-service".to_string(),
            service_version: "test".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            database: DatabaseConfig {
                url: Secret::new("postgres://localhost/identity".to_string()),
                max_connections: 5,
                min_connections: 1,
                acquire_timeout_seconds: 5,
            },
            jwt: JwtConfig {
                secret: Secret::new(secret.to_string()),
                token_expiry_days: 30,
            },
            registration: RegistrationConfig {
                default_role_name: "User".to_string(),
                default_specification: "Frontend".to_string(),
            },
            security: SecurityConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
        }
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Prod));
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Dev));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_token_expiry_days_bounded() {
        let mut config = sample(Environment::Dev, "s");
        for days in [0, -1, MAX_TOKEN_EXPIRY_DAYS + 1, 200_000_000_000_000] {
            config.jwt.token_expiry_days = days;
            assert!(config.validate().is_err(), "{days} days should be rejected");
        }

        config.jwt.token_expiry_days = MAX_TOKEN_EXPIRY_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected_in_prod_only() {
        assert!(sample(Environment::Dev, "short").validate().is_ok());
        assert!(sample(Environment::Prod, "short").validate().is_err());
        assert!(sample(Environment::Prod, &"x".repeat(MIN_PROD_SECRET_BYTES))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_wildcard_origin_rejected_in_prod() {
        let mut config = sample(Environment::Prod, &"x".repeat(MIN_PROD_SECRET_BYTES));
        config.security.allowed_origins = vec!["*".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let config = sample(Environment::Dev, "super-secret-signing-key");
        assert!(!format!("{:?}", config).contains("super-secret-signing-key"));
    }
}
