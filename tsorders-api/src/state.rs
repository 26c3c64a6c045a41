use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context};
use jsonwebtoken::Algorithm;
use tsorders_core::services::{OrderService, ShipmentService};
use tsorders_core::{CarrierGateway, OrderRepository};
use tsorders_shared::Masked;
use tsorders_store::app_config;

use crate::ledger::RefreshLedger;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: Masked<String>,
    pub algorithm: Algorithm,
    pub access_ttl: chrono::Duration,
    pub refresh_ttl: chrono::Duration,
    pub username: String,
    pub password: Masked<String>,
    pub secure_cookies: bool,
}

impl AuthConfig {
    pub fn from_settings(settings: &app_config::AuthConfig) -> anyhow::Result<Self> {
        let algorithm = Algorithm::from_str(&settings.jwt_algorithm)
            .with_context(|| format!("Unknown JWT algorithm {}", settings.jwt_algorithm))?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            bail!("JWT algorithm must be HS256, HS384 or HS512");
        }

        Ok(Self {
            secret: settings.jwt_secret.clone(),
            algorithm,
            access_ttl: chrono::Duration::minutes(settings.access_token_expire_minutes),
            refresh_ttl: chrono::Duration::days(settings.refresh_token_expire_days),
            username: settings.username.clone(),
            password: settings.password.clone(),
            secure_cookies: settings.secure_cookies,
        })
    }
}

/// What `GET /` reports about this deployment.
#[derive(Clone)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub environment: String,
    /// Adds the underlying cause to 500 bodies.
    pub debug: bool,
}

impl From<&app_config::AppConfig> for ServiceInfo {
    fn from(app: &app_config::AppConfig) -> Self {
        Self {
            name: app.name.clone(),
            version: app.version.clone(),
            environment: app.environment.clone(),
            debug: app.debug,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn OrderRepository>,
    pub orders: Arc<OrderService>,
    pub shipments: Arc<ShipmentService>,
    pub auth: AuthConfig,
    pub ledger: Arc<RefreshLedger>,
    pub info: ServiceInfo,
    pub cors_origins: Vec<String>,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        carrier: Arc<dyn CarrierGateway>,
        auth: AuthConfig,
        info: ServiceInfo,
        cors_origins: Vec<String>,
    ) -> Self {
        Self {
            orders: Arc::new(OrderService::new(repo.clone())),
            shipments: Arc::new(ShipmentService::new(repo.clone(), carrier)),
            repo,
            auth,
            ledger: Arc::new(RefreshLedger::new()),
            info,
            cors_origins,
        }
    }
}
