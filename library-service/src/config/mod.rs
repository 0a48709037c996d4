use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct LibraryConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub email: EmailConfig,
    pub invite: InviteConfig,
    pub retention: RetentionConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// SMTP settings. All optional: issuance only attempts delivery when the
/// configuration is complete.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl EmailConfig {
    /// Pre-check consulted before attempting delivery.
    pub fn is_complete(&self) -> bool {
        !self.host.is_empty() && !self.user.is_empty() && !self.pass.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct InviteConfig {
    /// Public base URL invitation links are built against.
    pub base_url: String,
    pub default_expiry_days: i64,
    /// Lifetime of the handoff cookie and the expiry baked into its value.
    pub handoff_ttl_seconds: i64,
    pub handoff_secret: String,
}

#[derive(Debug, Clone)]
pub struct RetentionConfig {
    /// Days a soft-deleted entry stays restorable.
    pub grace_days: i64,
    pub sweep_page_size: i64,
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

const DEV_HANDOFF_SECRET: &str = "dev-handoff-secret";

impl LibraryConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = LibraryConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("library-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
                min_connections: get_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?
                    .parse()
                    .unwrap_or(1),
            },
            email: EmailConfig {
                host: env::var("EMAIL_HOST").unwrap_or_default(),
                port: env::var("EMAIL_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(587),
                user: env::var("EMAIL_USER").unwrap_or_default(),
                pass: env::var("EMAIL_PASS").unwrap_or_default(),
                from: env::var("EMAIL_FROM")
                    .unwrap_or_else(|_| "noreply@secret-library.local".to_string()),
            },
            invite: InviteConfig {
                base_url: get_env("BASE_URL", Some("http://localhost:8080"), is_prod)?,
                default_expiry_days: get_env("INVITE_EXPIRY_DAYS", Some("7"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
                handoff_ttl_seconds: get_env("INVITE_HANDOFF_TTL_SECONDS", Some("600"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
                handoff_secret: get_env("INVITE_HANDOFF_SECRET", Some(DEV_HANDOFF_SECRET), is_prod)?,
            },
            retention: RetentionConfig {
                grace_days: get_env("RETENTION_GRACE_DAYS", Some("7"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
                sweep_page_size: get_env("SWEEP_PAGE_SIZE", Some("100"), is_prod)?
                    .parse()
                    .unwrap_or(100),
                sweep_interval_seconds: get_env("SWEEP_INTERVAL_SECONDS", Some("3600"), is_prod)?
                    .parse()
                    .unwrap_or(3600),
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.invite.default_expiry_days <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "INVITE_EXPIRY_DAYS must be positive"
            )));
        }

        if self.invite.handoff_ttl_seconds <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "INVITE_HANDOFF_TTL_SECONDS must be positive"
            )));
        }

        if self.retention.grace_days <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "RETENTION_GRACE_DAYS must be positive"
            )));
        }

        if self.retention.sweep_page_size <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SWEEP_PAGE_SIZE must be positive"
            )));
        }

        if self.environment == Environment::Prod {
            if self.invite.handoff_secret == DEV_HANDOFF_SECRET {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "INVITE_HANDOFF_SECRET must be set to a real secret in production"
                )));
            }

            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
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
