//! Shared "assessment pipeline" used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! feature vector -> evaluator (probability + threshold) -> explanation (TreeSHAP)
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use serde::Serialize;

use crate::domain::{Attribution, FeatureVector, RiskPrediction};
use crate::error::AppError;
use crate::model::RiskModel;

/// All computed outputs for one feature vector.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub inputs: FeatureVector,
    pub prediction: RiskPrediction,
    pub attribution: Attribution,
}

/// Risk evaluator: probability of the positive class plus the thresholded label.
pub fn evaluate(model: &RiskModel, features: &FeatureVector) -> Result<RiskPrediction, AppError> {
    let probabilities = model.predict_proba(features)?;
    let prediction = RiskPrediction::from_probabilities(probabilities);
    log::debug!(
        "evaluated: p(high)={:.4}% -> {}",
        prediction.percent,
        prediction.level.label()
    );
    Ok(prediction)
}

/// Explanation renderer input: attributions for `class_index`, one vector + one baseline.
pub fn explain(model: &RiskModel, features: &FeatureVector, class_index: usize) -> Result<Attribution, AppError> {
    model
        .shap_values(features)?
        .select(class_index, model.schema(), features)
}

/// Run evaluator then explainer for the evaluator's class.
pub fn assess(model: &RiskModel, features: &FeatureVector) -> Result<Assessment, AppError> {
    let prediction = evaluate(model, features)?;
    let attribution = explain(model, features, prediction.class_index())?;
    Ok(Assessment {
        inputs: features.clone(),
        prediction,
        attribution,
    })
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::domain::{FEATURE_MAX, FeatureVector, RiskLevel};
    use crate::model::tests::tiny_model;

    #[test]
    fn default_vector_regression_baseline() {
        let model = tiny_model();
        let a = assess(&model, &model.schema().default_vector()).unwrap();
        assert!((a.prediction.percent - 67.917_869_917_539).abs() < 1e-4);
        assert_eq!(a.prediction.level, RiskLevel::High);
        assert_eq!(a.attribution.class_index, 1);
    }

    #[test]
    fn all_zero_inputs_are_low_risk() {
        let model = tiny_model();
        let x = FeatureVector::from_values(model.schema(), vec![0.0; 19]).unwrap();
        let a = assess(&model, &x).unwrap();
        assert!((0.0..=100.0).contains(&a.prediction.percent));
        assert!((a.prediction.percent - 27.888_482_197_713).abs() < 1e-4);
        assert_eq!(a.prediction.level, RiskLevel::Low);
        assert_eq!(a.attribution.class_index, 0);
    }

    #[test]
    fn all_maximum_inputs_are_valid() {
        let model = tiny_model();
        let x = FeatureVector::from_values(model.schema(), vec![FEATURE_MAX; 19]).unwrap();
        let a = assess(&model, &x).unwrap();
        assert!((0.0..=100.0).contains(&a.prediction.percent));
        assert!((a.prediction.percent - 75.026_010_559_511).abs() < 1e-4);
    }

    #[test]
    fn random_inputs_respect_the_stated_rule() {
        let model = tiny_model();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let values: Vec<f64> = (0..19).map(|_| rng.gen_range(0.0..=FEATURE_MAX)).collect();
            let x = FeatureVector::from_values(model.schema(), values).unwrap();
            let a = assess(&model, &x).unwrap();
            let p = &a.prediction;

            assert_eq!(p.percent >= 50.0, p.level.label() == "High Risk");
            assert!(((p.probabilities[0] + p.probabilities[1]) * 100.0 - 100.0).abs() < 1e-9);

            let raw = model.class_output(&x, p.class_index()).unwrap();
            assert!((a.attribution.reconstructed_output() - raw).abs() < 1e-9);
        }
    }

    #[test]
    fn evaluation_is_deterministic() {
        let model = tiny_model();
        let x = model.schema().default_vector();
        let first = assess(&model, &x).unwrap();
        let second = assess(&model, &x).unwrap();
        assert_eq!(first.prediction, second.prediction);
        assert_eq!(first.attribution, second.attribution);
    }
}
