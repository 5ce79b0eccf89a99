//! Read feature overrides from a JSON object.
//!
//! The file maps gene names to expression levels:
//!
//! ```json
//! { "CYBB": 6000, "ANLN": 1200.5 }
//! ```
//!
//! Names not present keep their default. Unknown names are rejected so typos
//! do not silently fall back to defaults.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use crate::domain::{FeatureSchema, FeatureVector};
use crate::error::AppError;

/// Read `path` and apply its values on top of the schema defaults (clamped).
pub fn read_inputs_json(path: &Path, schema: &FeatureSchema) -> Result<FeatureVector, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::config(format!("Failed to open inputs JSON '{}': {e}", path.display())))?;
    let raw: BTreeMap<String, f64> = serde_json::from_reader(file).map_err(|e| {
        AppError::config(format!(
            "Invalid inputs JSON '{}': {e} (expected an object of name -> number)",
            path.display()
        ))
    })?;
    apply_inputs(schema, &raw)
}

fn apply_inputs(schema: &FeatureSchema, raw: &BTreeMap<String, f64>) -> Result<FeatureVector, AppError> {
    let mut features = schema.default_vector();
    for (name, &value) in raw {
        if !value.is_finite() {
            return Err(AppError::config(format!("Input '{name}' must be a finite number.")));
        }
        features.set_named(schema, name, value)?;
    }
    log::debug!("applied {} input overrides", raw.len());
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FEATURE_MAX;

    fn write(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inputs.json");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn overrides_apply_and_missing_keep_defaults() {
        let schema = FeatureSchema::builtin().unwrap();
        let (_dir, path) = write(r#"{ "CYBB": 6000, "CTD-3080P12.3": 2.5, "ANLN": 250000 }"#);
        let v = read_inputs_json(&path, &schema).unwrap();
        assert_eq!(v.get(schema.index_of("CYBB").unwrap()), Some(6000.0));
        assert_eq!(v.get(schema.index_of("CTD-3080P12.3").unwrap()), Some(2.5));
        assert_eq!(v.get(schema.index_of("ANLN").unwrap()), Some(FEATURE_MAX));
        assert_eq!(v.get(schema.index_of("PECAM1").unwrap()), Some(9621.0));
    }

    #[test]
    fn unknown_name_is_config_error() {
        let schema = FeatureSchema::builtin().unwrap();
        let (_dir, path) = write(r#"{ "CYBBB": 1 }"#);
        let err = read_inputs_json(&path, &schema).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
        assert!(err.message().contains("CYBBB"));
    }

    #[test]
    fn non_object_is_config_error() {
        let schema = FeatureSchema::builtin().unwrap();
        let (_dir, path) = write("[1, 2, 3]");
        let err = read_inputs_json(&path, &schema).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
    }

    #[test]
    fn missing_file_is_config_error() {
        let schema = FeatureSchema::builtin().unwrap();
        let err = read_inputs_json(Path::new("no/such/inputs.json"), &schema).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
    }
}
