// Engine configuration: process-wide settings and the per-run backtest parameters.
pub mod backtest;
pub mod settings;

pub use backtest::BacktestConfig;
pub use settings::{DataSettings, EngineSettings, SimulationSettings};
