use eduhub_api::payment::{DEFAULT_API_BASE, PaymentConfig};
use eduhub_api::state::ApiConfig;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    /// Create missing tables on startup
    pub run_schema_sync: bool,
    pub api: ApiConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingVar(key))
        };

        let payment = match (
            lookup("PAYMENT_KEY_ID"),
            lookup("PAYMENT_KEY_SECRET"),
            lookup("PAYMENT_WEBHOOK_SECRET"),
        ) {
            (Some(key_id), Some(key_secret), Some(webhook_secret)) => Some(PaymentConfig {
                key_id,
                key_secret,
                webhook_secret,
                api_base: lookup("PAYMENT_API_BASE")
                    .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            }),
            (None, None, None) => None,
            _ => return Err(ConfigError::IncompletePayment),
        };

        Ok(Config {
            port: parse_or(&lookup, "PORT", 8080)?,
            database_url: required("DATABASE_URL")?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            run_schema_sync: parse_or(&lookup, "RUN_SCHEMA_SYNC", false)?,
            api: ApiConfig {
                jwt_secret: required("JWT_SECRET")?,
                currency: lookup("CURRENCY").unwrap_or_else(|| "INR".to_string()),
                payment,
            },
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key)),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid value for: {0}")]
    InvalidValue(&'static str),
    #[error("PAYMENT_KEY_ID, PAYMENT_KEY_SECRET and PAYMENT_WEBHOOK_SECRET must be set together")]
    IncompletePayment,
}
