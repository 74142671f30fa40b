// Engine-internal models. Serializable contracts live in `shared::models`.
pub mod position;

pub use position::{ExitRules, Position};
