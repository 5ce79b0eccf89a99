//! Ensemble-level explainer and output-shape normalization.
//!
//! A tree explainer answers in the model's native shape: one combined output
//! for single-output (binary logistic) models, or one output per class for
//! softprob models. `RawAttribution` makes that shape an explicit variant, and
//! `RawAttribution::select` is the only place that turns either shape into the
//! single `Attribution` the renderers consume.

use crate::domain::{Attribution, FeatureContribution, FeatureSchema, FeatureVector};
use crate::error::AppError;
use crate::explain::tree_shap::tree_shap;
use crate::model::forest::Forest;

/// Attributions and baseline for one model output.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassAttribution {
    pub values: Vec<f64>,
    pub base_value: f64,
}

/// Explainer output in the model's native shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAttribution {
    /// One combined output: the positive-class log-odds.
    Single(ClassAttribution),
    /// One output per class, indexed by class.
    PerClass(Vec<ClassAttribution>),
}

impl RawAttribution {
    /// Normalize to one attribution vector plus one baseline for `class_index`.
    ///
    /// A single combined output is the positive-class log-odds and is returned
    /// as-is for either class, so a low-risk case shows the same margin the
    /// classifier thresholded.
    pub fn select(
        self,
        class_index: usize,
        schema: &FeatureSchema,
        features: &FeatureVector,
    ) -> Result<Attribution, AppError> {
        let selected = match self {
            RawAttribution::Single(attr) => match class_index {
                0 | 1 => attr,
                other => {
                    return Err(AppError::runtime(format!(
                        "Cannot explain class {other}: the model has a single combined output."
                    )));
                }
            },
            RawAttribution::PerClass(mut classes) => {
                if class_index >= classes.len() {
                    return Err(AppError::runtime(format!(
                        "Cannot explain class {class_index}: the explainer returned {} class outputs.",
                        classes.len()
                    )));
                }
                classes.swap_remove(class_index)
            }
        };

        if selected.values.len() != schema.len() || features.len() != schema.len() {
            return Err(AppError::runtime(format!(
                "Attribution shape mismatch: {} contributions, {} inputs, {} schema features.",
                selected.values.len(),
                features.len(),
                schema.len()
            )));
        }

        let features = schema
            .names()
            .iter()
            .zip(features.values())
            .zip(selected.values)
            .map(|((name, &value), contribution)| FeatureContribution {
                name: name.clone(),
                value,
                contribution,
            })
            .collect();

        Ok(Attribution {
            class_index,
            base_value: selected.base_value,
            features,
        })
    }
}

/// TreeSHAP over a whole forest.
///
/// Holds only the per-output baselines; the forest itself is passed in on each
/// call so the explainer can live next to it inside `RiskModel`.
#[derive(Debug, Clone)]
pub struct TreeExplainer {
    expected_values: Vec<f64>,
}

impl TreeExplainer {
    pub fn new(forest: &Forest) -> Self {
        let mut expected_values = forest.base_margin().to_vec();
        for (group, tree) in forest.grouped_trees() {
            expected_values[group] += tree.expected_value();
        }
        Self { expected_values }
    }

    pub fn shap_values(&self, forest: &Forest, x: &[f64]) -> RawAttribution {
        let mut phi = vec![vec![0.0; x.len()]; self.expected_values.len()];
        for (group, tree) in forest.grouped_trees() {
            tree_shap(tree, x, &mut phi[group]);
        }
        let mut outputs: Vec<ClassAttribution> = phi
            .into_iter()
            .zip(&self.expected_values)
            .map(|(values, &base_value)| ClassAttribution { values, base_value })
            .collect();

        if outputs.len() == 1 {
            RawAttribution::Single(outputs.remove(0))
        } else {
            RawAttribution::PerClass(outputs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RiskModel;
    use crate::model::tests::tiny_model;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn contribution(attr: &Attribution, name: &str) -> f64 {
        attr.features
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.contribution)
            .unwrap()
    }

    #[test]
    fn fixture_matches_brute_force_shapley() {
        let model = tiny_model();
        let x = model.schema().default_vector();
        let attr = model.shap_values(&x).unwrap().select(1, model.schema(), &x).unwrap();

        assert!(close(attr.base_value, 0.17));
        assert!(close(contribution(&attr, "ANLN"), 0.1225));
        assert!(close(contribution(&attr, "MARCO"), 0.115_714_285_714));
        assert!(close(contribution(&attr, "CYBB"), 0.236_785_714_285));
        assert!(close(contribution(&attr, "PECAM1"), 0.105));
        assert_eq!(contribution(&attr, "SLC6A13"), 0.0);
    }

    #[test]
    fn additivity_holds_for_both_classes() {
        let model = tiny_model();
        let schema = model.schema();
        for x in [
            schema.default_vector(),
            FeatureVector::from_values(schema, vec![0.0; 19]).unwrap(),
            FeatureVector::from_values(schema, vec![100_000.0; 19]).unwrap(),
        ] {
            for class in [0, 1] {
                let attr = model.shap_values(&x).unwrap().select(class, schema, &x).unwrap();
                let raw = model.class_output(&x, class).unwrap();
                assert!((attr.reconstructed_output() - raw).abs() < 1e-9, "class {class}");
            }
        }
    }

    #[test]
    fn single_output_is_shared_by_both_classes() {
        let model = tiny_model();
        let x = FeatureVector::from_values(model.schema(), vec![0.0; 19]).unwrap();
        let a1 = model.shap_values(&x).unwrap().select(1, model.schema(), &x).unwrap();
        let a0 = model.shap_values(&x).unwrap().select(0, model.schema(), &x).unwrap();
        assert_eq!(a0.class_index, 0);
        assert_eq!(a0.base_value, a1.base_value);
        assert_eq!(a0.features, a1.features);

        // Low-risk input: the explained output is the negative positive-class margin.
        assert!(close(a0.base_value, 0.17));
        assert!(close(a0.reconstructed_output(), -0.95));
        assert!(close(a0.reconstructed_output(), model.forest().predict_margin(x.values())[0]));
    }

    #[test]
    fn per_class_output_is_selected_by_index() {
        let json = r#"{"learner": {
            "feature_names": [],
            "gradient_booster": {"name": "gbtree", "model": {"tree_info": [0, 1], "trees": [
                {"left_children": [1, -1, -1], "right_children": [2, -1, -1],
                 "split_indices": [13, 0, 0], "split_conditions": [5000.0, 0.5, -0.5],
                 "default_left": [1, 0, 0], "sum_hessian": [4.0, 1.0, 3.0]},
                {"left_children": [1, -1, -1], "right_children": [2, -1, -1],
                 "split_indices": [1, 0, 0], "split_conditions": [3000.0, -0.25, 0.75],
                 "default_left": [0, 0, 0], "sum_hessian": [4.0, 2.0, 2.0]}
            ]}},
            "learner_model_param": {"base_score": "5E-1", "num_class": "2", "num_feature": "19"},
            "objective": {"name": "multi:softprob"}
        }}"#;
        let model = RiskModel::from_json(json, FeatureSchema::builtin().unwrap()).unwrap();
        let x = model.schema().default_vector();

        let raw = model.shap_values(&x).unwrap();
        let RawAttribution::PerClass(classes) = &raw else {
            panic!("expected per-class output");
        };
        assert_eq!(classes.len(), 2);

        for class in [0, 1] {
            let attr = raw.clone().select(class, model.schema(), &x).unwrap();
            let out = model.class_output(&x, class).unwrap();
            assert!((attr.reconstructed_output() - out).abs() < 1e-9);
        }
        let attr1 = raw.clone().select(1, model.schema(), &x).unwrap();
        assert_eq!(contribution(&attr1, "CYBB"), 0.0);
        assert!(close(contribution(&attr1, "ANLN"), 0.5));
        assert!(raw.select(2, model.schema(), &x).is_err());
    }

    #[test]
    fn shape_mismatch_is_an_error_not_a_panic() {
        let schema = FeatureSchema::builtin().unwrap();
        let x = schema.default_vector();
        let raw = RawAttribution::Single(ClassAttribution { values: vec![0.0; 3], base_value: 0.0 });
        let err = raw.select(1, &schema, &x).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_RUNTIME);
        assert!(err.message().contains("shape mismatch"));

        let raw = RawAttribution::Single(ClassAttribution { values: vec![0.0; 19], base_value: 0.0 });
        assert!(raw.select(7, &schema, &x).is_err());
    }
}
