//! Input/output helpers.
//!
//! - JSON feature overrides for `predict --inputs` (`inputs`)
//! - assessment export to JSON (`export`)

pub mod export;
pub mod inputs;

pub use export::*;
pub use inputs::*;
