//! Export a full assessment to JSON.
//!
//! The export is meant to be easy to consume in downstream scripts: inputs by
//! name, both class probabilities, the label and the signed contributions.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::pipeline::Assessment;
use crate::domain::{Attribution, RiskPrediction};
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct AssessmentFile<'a> {
    tool: &'static str,
    generated_at: DateTime<Utc>,
    model: String,
    inputs: Vec<NamedInput<'a>>,
    prediction: &'a RiskPrediction,
    risk_label: &'static str,
    risk_color: String,
    advice: &'static str,
    attribution: &'a Attribution,
}

#[derive(Debug, Serialize)]
struct NamedInput<'a> {
    name: &'a str,
    value: f64,
}

/// Write `assessment` as pretty-printed JSON.
pub fn write_assessment_json(path: &Path, assessment: &Assessment, model_source: &Path) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::runtime(format!("Failed to create export JSON '{}': {e}", path.display())))?;

    // Contributions carry names in model order, so the inputs can borrow them.
    let inputs = assessment
        .attribution
        .features
        .iter()
        .map(|f| NamedInput { name: &f.name, value: f.value })
        .collect();

    let level = assessment.prediction.level;
    let out = AssessmentFile {
        tool: "risk",
        generated_at: Utc::now(),
        model: model_source.display().to_string(),
        inputs,
        prediction: &assessment.prediction,
        risk_label: level.label(),
        risk_color: level.hex_color(),
        advice: level.advice(),
        attribution: &assessment.attribution,
    };

    serde_json::to_writer_pretty(file, &out)
        .map_err(|e| AppError::runtime(format!("Failed to write export JSON: {e}")))?;
    Ok(())
}
