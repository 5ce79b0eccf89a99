//! Feature attribution for tree ensembles.
//!
//! - exact per-tree TreeSHAP (`tree_shap`)
//! - forest-level explainer + output-shape normalization (`attribution`)

pub mod attribution;
pub mod tree_shap;

pub use attribution::*;
pub use tree_shap::tree_shap;
