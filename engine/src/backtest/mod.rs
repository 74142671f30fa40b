// Signal evaluation: forward-return scoring and PnL simulation
pub mod forward_returns;
pub mod metrics;
pub mod simulator;

pub use forward_returns::evaluate;
pub use simulator::{simulate, SimulationParams};
