//! Feature schema and feature vectors.
//!
//! The schema is the single source of truth for feature order. The model loader
//! checks the artifact against it, the collectors build vectors from it, and
//! attributions are labelled with it, so all three orderings agree.

use serde::Serialize;

use crate::error::AppError;

/// Lower bound of every gene-expression control.
pub const FEATURE_MIN: f64 = 0.0;
/// Upper bound of every gene-expression control.
pub const FEATURE_MAX: f64 = 100_000.0;

/// Gene features in the order the classifier was trained on.
pub const FEATURE_NAMES: [&str; 19] = [
    "SLC6A13",
    "ANLN",
    "MARCO",
    "SYT13",
    "ARG2",
    "MEFV",
    "ZNF29P",
    "FLVCR2",
    "PTGFR",
    "CRISP2",
    "EME1",
    "IL22RA2",
    "SLC29A4",
    "CYBB",
    "LRRC25",
    "SCN8A",
    "LILRA6",
    "CTD-3080P12.3",
    "PECAM1",
];

/// Slider defaults, aligned with `FEATURE_NAMES`.
pub const DEFAULT_VALUES: [f64; 19] = [
    8.0, 4870.0, 671.0, 1.0, 250.0, 284.0, 1.0, 721.0, 11.0, 1.0, 372.0, 41.0, 67.0, 5785.0,
    417.0, 141.0, 247.0, 0.0, 9621.0,
];

/// Ordered feature names with their default values.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    names: Vec<String>,
    defaults: Vec<f64>,
}

impl FeatureSchema {
    /// Build a schema, rejecting a names/defaults count mismatch.
    pub fn new(names: Vec<String>, defaults: Vec<f64>) -> Result<Self, AppError> {
        if names.len() != defaults.len() {
            return Err(AppError::config(format!(
                "Feature names and default values must have the same length (names={}, defaults={}).",
                names.len(),
                defaults.len()
            )));
        }
        if names.is_empty() {
            return Err(AppError::config("Feature schema is empty."));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(AppError::config(format!("Duplicate feature name '{name}'.")));
            }
        }
        let defaults = defaults.into_iter().map(clamp_feature).collect();
        Ok(Self { names, defaults })
    }

    /// The 19-gene schema used by the risk model.
    pub fn builtin() -> Result<Self, AppError> {
        Self::new(
            FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            DEFAULT_VALUES.to_vec(),
        )
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn defaults(&self) -> &[f64] {
        &self.defaults
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn default_vector(&self) -> FeatureVector {
        FeatureVector {
            values: self.defaults.clone(),
        }
    }
}

/// One row of model input, in schema order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Build a vector from raw values, clamping each into the control range.
    pub fn from_values(schema: &FeatureSchema, values: Vec<f64>) -> Result<Self, AppError> {
        if values.len() != schema.len() {
            return Err(AppError::config(format!(
                "Expected {} feature values, got {}.",
                schema.len(),
                values.len()
            )));
        }
        Ok(Self {
            values: values.into_iter().map(clamp_feature).collect(),
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Set a value by position (clamped). Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, value: f64) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = clamp_feature(value);
        }
    }

    /// Set a value by feature name (clamped).
    pub fn set_named(&mut self, schema: &FeatureSchema, name: &str, value: f64) -> Result<(), AppError> {
        let index = schema.index_of(name).ok_or_else(|| {
            AppError::config(format!(
                "Unknown feature '{name}'. Run `risk features` to list valid names."
            ))
        })?;
        self.set(index, value);
        Ok(())
    }

    /// Index of the largest value (first one on ties).
    pub fn argmax(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.values.iter().enumerate() {
            match best {
                Some((_, b)) if v <= b => {}
                _ => best = Some((i, v)),
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Clamp into `[FEATURE_MIN, FEATURE_MAX]`; non-finite values fall to the minimum.
pub fn clamp_feature(value: f64) -> f64 {
    if !value.is_finite() {
        return FEATURE_MIN;
    }
    value.clamp(FEATURE_MIN, FEATURE_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_schema_has_nineteen_features() {
        let schema = FeatureSchema::builtin().unwrap();
        assert_eq!(schema.len(), 19);
        assert_eq!(schema.name(13), Some("CYBB"));
        assert_eq!(schema.index_of("CTD-3080P12.3"), Some(17));
        assert_eq!(schema.default_vector().values(), &DEFAULT_VALUES);
    }

    #[test]
    fn mismatched_defaults_abort() {
        let err = FeatureSchema::new(vec!["A".into(), "B".into()], vec![1.0]).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
        assert!(err.message().contains("same length"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        assert!(FeatureSchema::new(vec!["A".into(), "A".into()], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn values_are_clamped() {
        let schema = FeatureSchema::builtin().unwrap();
        let mut values = vec![0.0; 19];
        values[0] = -5.0;
        values[1] = 250_000.0;
        values[2] = f64::NAN;
        values[3] = f64::INFINITY;
        values[4] = f64::NEG_INFINITY;
        let v = FeatureVector::from_values(&schema, values).unwrap();
        assert_eq!(v.get(0), Some(FEATURE_MIN));
        assert_eq!(v.get(1), Some(FEATURE_MAX));
        assert_eq!(v.get(2), Some(FEATURE_MIN));
        assert_eq!(v.get(3), Some(FEATURE_MIN));
        assert_eq!(v.get(4), Some(FEATURE_MIN));
    }

    #[test]
    fn wrong_value_count_is_a_config_error() {
        let schema = FeatureSchema::builtin().unwrap();
        assert!(FeatureVector::from_values(&schema, vec![1.0; 18]).is_err());
    }

    #[test]
    fn set_named_updates_and_rejects_unknown() {
        let schema = FeatureSchema::builtin().unwrap();
        let mut v = schema.default_vector();
        v.set_named(&schema, "PECAM1", 123.5).unwrap();
        assert_eq!(v.get(18), Some(123.5));
        assert!(v.set_named(&schema, "TP53", 1.0).is_err());
    }

    #[test]
    fn argmax_picks_largest_input() {
        let schema = FeatureSchema::builtin().unwrap();
        assert_eq!(schema.default_vector().argmax(), Some(18));
    }
}
