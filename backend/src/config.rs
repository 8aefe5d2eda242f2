//! Configuration management for the Meal Program Cost Engine
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with MP_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Token secret used when none is configured; never valid in production
pub const DEV_JWT_SECRET: &str = "development-secret-key";

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Cost engine tuning
    pub costing: CostingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for verifying JWT tokens
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CostingConfig {
    /// Maximum hours between record creation and distribution to count as on time
    pub on_time_threshold_hours: i64,

    /// Absolute variance percentage above which a category is flagged
    pub significant_variance_percent: Decimal,

    /// Currency label attached to reports
    pub currency: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("MP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.secret", DEV_JWT_SECRET)?
            .set_default("costing.on_time_threshold_hours", 24)?
            .set_default("costing.significant_variance_percent", "20")?
            .set_default("costing.currency", shared::DEFAULT_CURRENCY)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (MP_ prefix)
            .add_source(
                Environment::with_prefix("MP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for CostingConfig {
    fn default() -> Self {
        Self {
            on_time_threshold_hours: shared::efficiency::DEFAULT_ON_TIME_THRESHOLD_HOURS,
            significant_variance_percent: shared::variance::DEFAULT_SIGNIFICANT_VARIANCE_PERCENT,
            currency: shared::DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl CostingConfig {
    pub fn on_time_threshold(&self) -> chrono::Duration {
        chrono::Duration::hours(self.on_time_threshold_hours)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/meal_program".to_string(),
            max_connections: 10,
            min_connections: 2,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            jwt: JwtConfig {
                secret: DEV_JWT_SECRET.to_string(),
            },
            costing: CostingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_costing_defaults() {
        let costing = CostingConfig::default();
        assert_eq!(costing.on_time_threshold(), chrono::Duration::hours(24));
        assert_eq!(costing.significant_variance_percent, Decimal::from(20));
        assert_eq!(costing.currency, "IDR");
    }
}
