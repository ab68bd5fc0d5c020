use std::{sync::Arc, time::Duration};

use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::error::ApiError;
use crate::middleware::jwt::Claims;
use crate::payment::{DynGateway, PaymentConfig, RazorpayGateway};

pub type AppState = Arc<State>;

/// Settings the API layer needs; the server binary fills these from the
/// environment.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub jwt_secret: String,
    pub currency: String,
    pub payment: Option<PaymentConfig>,
}

/// Cached auth result, keyed by a hash of the bearer token
#[derive(Clone, Debug)]
pub enum CachedAuth {
    Valid(Claims),
    Invalid,
}

pub struct State {
    pub db: DatabaseConnection,
    pub config: ApiConfig,
    pub gateway: Option<DynGateway>,
    /// Short TTL so revoked roles do not linger
    pub auth_cache: moka::sync::Cache<String, CachedAuth>,
}

impl State {
    pub fn new(db: DatabaseConnection, config: ApiConfig) -> Self {
        let gateway = config
            .payment
            .clone()
            .map(|payment| Arc::new(RazorpayGateway::new(payment)) as DynGateway);

        if gateway.is_none() {
            tracing::warn!("Payment gateway not configured, paid checkouts will be rejected");
        }

        Self::with_gateway(db, config, gateway)
    }

    pub fn with_gateway(
        db: DatabaseConnection,
        config: ApiConfig,
        gateway: Option<DynGateway>,
    ) -> Self {
        let auth_cache = moka::sync::Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(240))
            .build();

        Self {
            db,
            config,
            gateway,
            auth_cache,
        }
    }

    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        config: ApiConfig,
    ) -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new(database_url.to_owned());
        opt.max_connections(max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let db = Database::connect(opt).await?;
        Ok(Self::new(db, config))
    }

    pub fn gateway(&self) -> Result<&DynGateway, ApiError> {
        self.gateway
            .as_ref()
            .ok_or_else(|| ApiError::service_unavailable("Payment gateway is not configured"))
    }

    /// Validates an HS256 token, consulting the auth cache first.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let key = blake3::hash(token.as_bytes()).to_hex().to_string();

        if let Some(cached) = self.auth_cache.get(&key) {
            return match cached {
                CachedAuth::Valid(claims) if !claims.is_expired() => Ok(claims),
                CachedAuth::Valid(_) => {
                    self.auth_cache.invalidate(&key);
                    Err(ApiError::unauthorized("Token expired"))
                }
                CachedAuth::Invalid => Err(ApiError::unauthorized("Invalid token")),
            };
        }

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        );

        match decoded {
            Ok(data) => {
                self.auth_cache
                    .insert(key, CachedAuth::Valid(data.claims.clone()));
                Ok(data.claims)
            }
            Err(err) => {
                self.auth_cache.insert(key, CachedAuth::Invalid);
                Err(err.into())
            }
        }
    }
}
