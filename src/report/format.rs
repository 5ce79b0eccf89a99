//! Formatted terminal output for the `predict` and `features` commands.
//!
//! We keep formatting code in one place so:
//! - the model/explanation code stays clean and testable
//! - output changes are localized

use crate::domain::{Attribution, FEATURE_MAX, FEATURE_MIN, FeatureSchema, FeatureVector, RiskPrediction};

/// Input table: one row per gene, the largest input marked with `*`.
pub fn format_input_table(schema: &FeatureSchema, inputs: &FeatureVector) -> String {
    let mut out = String::new();
    out.push_str("=== Input Gene Expression Data ===\n");
    out.push_str(&format!("{:<16} {:>12}\n", "gene", "level"));
    out.push_str(&format!("{:-<16} {:-<12}\n", "", ""));

    let max_idx = inputs.argmax();
    for (i, (name, value)) in schema.names().iter().zip(inputs.values()).enumerate() {
        let mark = if Some(i) == max_idx { " *" } else { "" };
        out.push_str(&format!("{:<16} {:>12.1}{mark}\n", truncate(name, 16), value));
    }
    out
}

/// Probability, label and the canned advice.
pub fn format_assessment(prediction: &RiskPrediction) -> String {
    let mut out = String::new();
    out.push_str("=== Risk Assessment Results ===\n");
    out.push_str(&format!("Predicted Probability: {:.2}%\n", prediction.percent));
    out.push_str(&format!(
        "Risk Level: {} ({})\n",
        prediction.level.label(),
        prediction.level.hex_color()
    ));
    out.push_str("\nMedical Advice:\n");
    out.push_str(&wrap(prediction.level.advice(), 78));
    out
}

/// Contributions sorted by magnitude, plus baseline and reconstructed output.
pub fn format_attribution_table(attribution: &Attribution) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== SHAP Explanation (class {}) ===\n",
        attribution.class_index
    ));
    out.push_str(&format!("{:<16} {:>12} {:>14}\n", "gene", "level", "contribution"));
    out.push_str(&format!("{:-<16} {:-<12} {:-<14}\n", "", "", ""));

    let ranked = attribution.ranked();
    for f in &ranked {
        out.push_str(&format!(
            "{:<16} {:>12.1} {:>+14.4}\n",
            truncate(&f.name, 16),
            f.value,
            f.contribution
        ));
    }
    let zero = attribution.features.len() - ranked.len();
    if zero > 0 {
        out.push_str(&format!("({zero} genes with zero contribution omitted)\n"));
    }
    out.push_str(&format!("base value: {:+.4}\n", attribution.base_value));
    out.push_str(&format!("model output: {:+.4}\n", attribution.reconstructed_output()));
    out
}

/// Feature order, range and defaults.
pub fn format_feature_schema(schema: &FeatureSchema) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>3} {:<16} {:>10} {:>10} {:>10}\n", "#", "gene", "min", "max", "default"));
    for (i, (name, default)) in schema.names().iter().zip(schema.defaults()).enumerate() {
        out.push_str(&format!(
            "{:>3} {:<16} {:>10.1} {:>10.1} {:>10.1}\n",
            i,
            truncate(name, 16),
            FEATURE_MIN,
            FEATURE_MAX,
            default
        ));
    }
    out
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('~');
    out
}

/// Greedy word wrap.
pub fn wrap(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut line_len = 0;
    for word in text.split_whitespace() {
        let len = word.chars().count();
        if line_len > 0 && line_len + 1 + len > width {
            out.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        out.push_str(word);
        line_len += len;
    }
    out.push('\n');
    out
}
