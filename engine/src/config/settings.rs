// Engine settings, loaded from an optional JSON file with every field defaulted
use crate::config::BacktestConfig;
use crate::error::{EngineError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable consulted when no config path is given on the command line.
pub const CONFIG_ENV_VAR: &str = "ENGINE_CONFIG";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct EngineSettings {
    pub data: DataSettings,
    pub simulation: SimulationSettings,
    pub backtest: BacktestConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataSettings {
    pub binance_base_url: String,
    pub yahoo_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Largest kline page the primary source serves per request.
    pub page_size: usize,
    /// Extra history fetched ahead of `limit` so long-window indicators are defined.
    pub warmup_bars: usize,
    /// When set, candles are read from this file instead of the network.
    pub csv_path: Option<PathBuf>,
}

impl Default for DataSettings {
    fn default() -> Self {
        DataSettings {
            binance_base_url: "https://api.binance.com".to_string(),
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            request_timeout_secs: 10,
            user_agent: "home-trader-backtest/0.1".to_string(),
            page_size: 1000,
            warmup_bars: 200,
            csv_path: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulationSettings {
    /// Charged on each leg of a round trip.
    pub fee_rate: f64,
    pub initial_capital: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            fee_rate: 0.001,
            initial_capital: 1000.0,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.fee_rate.is_finite() || !(0.0..1.0).contains(&self.fee_rate) {
            return Err(EngineError::ConfigError(format!("fee_rate must be in [0, 1), got {}", self.fee_rate)));
        }
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(EngineError::ConfigError(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        Ok(())
    }
}

impl EngineSettings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let settings: EngineSettings = serde_json::from_str(&raw)
            .map_err(|e| EngineError::ConfigError(format!("Invalid settings file '{}': {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Explicit path first, then `ENGINE_CONFIG`, then built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        match path.map(Path::to_path_buf).or(env_path) {
            Some(p) => {
                tracing::info!(path = %p.display(), "Loading engine settings");
                Self::from_file(&p)
            }
            None => {
                tracing::info!("No settings file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.data.page_size == 0 {
            return Err(EngineError::ConfigError("data.page_size must be positive".to_string()));
        }
        self.simulation.validate()?;
        self.backtest.validate()
    }
}
