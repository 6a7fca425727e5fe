//! Engine configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Monitoring configuration.
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// Escalation sweep configuration.
    #[serde(default)]
    pub sweep: SweepConfig,
    /// Listing configuration.
    #[serde(default)]
    pub listing: ListingConfig,
}

/// Monitoring engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// Upper bound applied to the accumulated risk score of one check.
    #[serde(default = "default_risk_score_cap")]
    pub risk_score_cap: Decimal,
}

fn default_risk_score_cap() -> Decimal {
    Decimal::ONE_HUNDRED
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            risk_score_cap: default_risk_score_cap(),
        }
    }
}

/// Escalation sweep configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Maximum number of overdue requests handled per sweep invocation.
    /// The external scheduler is expected to call the sweep repeatedly,
    /// so a bounded batch keeps a single run short.
    #[serde(default = "default_sweep_batch_limit")]
    pub batch_limit: usize,
}

fn default_sweep_batch_limit() -> usize {
    500
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            batch_limit: default_sweep_batch_limit(),
        }
    }
}

/// Listing configuration for query operations.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    /// Maximum number of records returned by a single list call.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

fn default_max_page_size() -> usize {
    1000
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            max_page_size: default_max_page_size(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            monitoring: MonitoringConfig::default(),
            sweep: SweepConfig::default(),
            listing: ListingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Reads `config/default` and `config/{RUN_MODE}` (both optional),
    /// then overlays `SENTRA__`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SENTRA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
