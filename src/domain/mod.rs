//! Domain types shared by the collectors, the evaluator and the renderers.
//!
//! - feature schema + feature vectors (`types`)
//! - risk labels, predictions and attributions (`risk`)

pub mod risk;
pub mod types;

pub use risk::*;
pub use types::*;
