//! Prediction and attribution outputs.

use serde::Serialize;

/// Decision threshold on the positive-class probability, in percent.
pub const HIGH_RISK_THRESHOLD_PERCENT: f64 = 50.0;

const HIGH_RISK_ADVICE: &str = "We're sorry to inform you that, according to the model's prediction, you have a high risk of having the disease. It's advisable to contact a healthcare professional for a thorough examination at the earliest. Please note that our results are for reference only and cannot replace a professional diagnosis from a hospital.";

const LOW_RISK_ADVICE: &str = "We're glad to inform you that, according to the model's prediction, your disease risk is low. If you experience any discomfort, it's still advisable to consult a doctor. Please maintain a healthy lifestyle and have regular medical check-ups. Wishing you good health.";

/// Thresholded risk label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    High,
}

impl RiskLevel {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= HIGH_RISK_THRESHOLD_PERCENT {
            RiskLevel::High
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::High => "High Risk",
        }
    }

    /// Model output class this label corresponds to.
    pub fn class_index(self) -> usize {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::High => 1,
        }
    }

    /// Display color as `(r, g, b)`.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            RiskLevel::Low => (0x33, 0xC1, 0xFF),
            RiskLevel::High => (0xFF, 0x57, 0x33),
        }
    }

    pub fn hex_color(self) -> String {
        let (r, g, b) = self.rgb();
        format!("#{r:02X}{g:02X}{b:02X}")
    }

    pub fn advice(self) -> &'static str {
        match self {
            RiskLevel::Low => LOW_RISK_ADVICE,
            RiskLevel::High => HIGH_RISK_ADVICE,
        }
    }
}

/// Evaluator output for one feature vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskPrediction {
    /// `[p(low), p(high)]`, summing to 1.
    pub probabilities: [f64; 2],
    /// Positive-class probability in percent.
    pub percent: f64,
    pub level: RiskLevel,
}

impl RiskPrediction {
    pub fn from_probabilities(probabilities: [f64; 2]) -> Self {
        let percent = probabilities[1] * 100.0;
        Self {
            probabilities,
            percent,
            level: RiskLevel::from_percent(percent),
        }
    }

    pub fn class_index(&self) -> usize {
        self.level.class_index()
    }
}

/// Per-feature contributions for one class, relative to a baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribution {
    pub class_index: usize,
    pub base_value: f64,
    pub features: Vec<FeatureContribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureContribution {
    pub name: String,
    pub value: f64,
    pub contribution: f64,
}

impl Attribution {
    /// Baseline plus all contributions, i.e. the explained raw model output.
    pub fn reconstructed_output(&self) -> f64 {
        self.base_value + self.features.iter().map(|f| f.contribution).sum::<f64>()
    }

    /// Contributions sorted by descending magnitude, dropping exact zeros.
    pub fn ranked(&self) -> Vec<&FeatureContribution> {
        let mut out: Vec<&FeatureContribution> =
            self.features.iter().filter(|f| f.contribution != 0.0).collect();
        out.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        out
    }
}
