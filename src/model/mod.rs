//! The frozen classifier.
//!
//! `RiskModel` is loaded once at startup and then only borrowed: the evaluator
//! and the explanation renderer both take `&RiskModel`, so there is no global
//! model state anywhere in the crate.

pub mod forest;
pub mod tree;
pub mod xgboost;

use std::path::{Path, PathBuf};

use crate::domain::{FeatureSchema, FeatureVector};
use crate::error::AppError;
use crate::explain::{RawAttribution, TreeExplainer};

pub use forest::{Forest, Objective};
pub use tree::{Node, Tree};

/// A loaded model plus everything needed to explain it.
#[derive(Debug, Clone)]
pub struct RiskModel {
    schema: FeatureSchema,
    forest: Forest,
    explainer: TreeExplainer,
    source: PathBuf,
}

impl RiskModel {
    /// Load an XGBoost JSON model and check it against `schema`.
    pub fn load(path: &Path, schema: FeatureSchema) -> Result<Self, AppError> {
        let forest = xgboost::load_forest(path, &schema)?;
        log::info!(
            "loaded model '{}' ({} trees, objective {})",
            path.display(),
            forest.trees().len(),
            forest.objective().display_name()
        );
        Ok(Self::from_forest(forest, schema, path.to_path_buf()))
    }

    /// Parse a model from JSON text (no file involved).
    pub fn from_json(json: &str, schema: FeatureSchema) -> Result<Self, AppError> {
        let forest = xgboost::parse_forest(json, &schema)?;
        Ok(Self::from_forest(forest, schema, PathBuf::from("<memory>")))
    }

    pub fn from_forest(forest: Forest, schema: FeatureSchema, source: PathBuf) -> Self {
        let explainer = TreeExplainer::new(&forest);
        Self {
            schema,
            forest,
            explainer,
            source,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// `[p(low risk), p(high risk)]` for one feature vector.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], AppError> {
        self.check_len(features)?;
        self.forest.predict_proba(features.values())
    }

    /// Raw model output for one class (the quantity attributions decompose).
    pub fn class_output(&self, features: &FeatureVector, class_index: usize) -> Result<f64, AppError> {
        self.check_len(features)?;
        self.forest.class_output(features.values(), class_index)
    }

    /// Exact TreeSHAP values in the model's native output shape.
    pub fn shap_values(&self, features: &FeatureVector) -> Result<RawAttribution, AppError> {
        self.check_len(features)?;
        Ok(self.explainer.shap_values(&self.forest, features.values()))
    }

    fn check_len(&self, features: &FeatureVector) -> Result<(), AppError> {
        if features.len() != self.schema.len() {
            return Err(AppError::runtime(format!(
                "Feature vector has {} values, model expects {}.",
                features.len(),
                self.schema.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// The three-tree fixture model over the built-in schema.
    pub(crate) fn tiny_model() -> RiskModel {
        RiskModel::from_json(
            crate::model::xgboost::tests::TINY_FOREST,
            FeatureSchema::builtin().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn predicts_fixture_default() {
        let model = tiny_model();
        let p = model.predict_proba(&model.schema().default_vector()).unwrap();
        assert!((p[1] - 0.679_178_699_175_392_9).abs() < 1e-6);
        assert!((model.class_output(&model.schema().default_vector(), 1).unwrap() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("XGBoost.json");
        std::fs::write(&path, crate::model::xgboost::tests::TINY_FOREST).unwrap();
        let model = RiskModel::load(&path, FeatureSchema::builtin().unwrap()).unwrap();
        assert_eq!(model.source(), path.as_path());
        assert_eq!(model.forest().trees().len(), 3);
    }
}
