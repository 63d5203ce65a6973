use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

use crate::money::CurrencyFormat;

const DEFAULT_ENV: &str = "development";
const DEFAULT_LOG_LEVEL: &str = "info";
const CONFIG_DIR: &str = "config";
/// Flat per-order service fee charged by the canteen.
const DEFAULT_SERVICE_FEE: i64 = 2000;

/// Pricing engine configuration with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    /// Flat service fee added to every order.
    #[serde(default = "default_service_fee")]
    #[validate(range(min = 0))]
    pub service_fee: i64,

    /// Currency display settings.
    #[serde(default)]
    pub currency: CurrencyFormat,

    /// Log level for the embedding application ("info", "debug", ...)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_service_fee() -> i64 {
    DEFAULT_SERVICE_FEE
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            service_fee: default_service_fee(),
            currency: CurrencyFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PricingConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Loads configuration from optional `config/{default,<env>}` files and
/// `APP__`-prefixed environment variables, then validates it. The profile is
/// selected with `RUN_ENV` or `APP_ENV`.
pub fn load_config() -> Result<PricingConfig, PricingConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading pricing configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let pricing_config: PricingConfig = config.try_deserialize()?;

    pricing_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        PricingConfigError::Validation(e)
    })?;

    Ok(pricing_config)
}
