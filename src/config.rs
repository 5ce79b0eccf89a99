//! Runtime configuration: where the model lives, where charts go, where logs go.
//!
//! Precedence for the model path: `--model` flag, then `RISK_MODEL_PATH` (from
//! the environment or a `.env` file), then `XGBoost.json` in the working
//! directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable naming the model file.
pub const MODEL_PATH_ENV: &str = "RISK_MODEL_PATH";
/// Environment variable holding the `env_logger` filter.
pub const LOG_ENV: &str = "RISK_LOG";

pub const DEFAULT_MODEL_PATH: &str = "XGBoost.json";
pub const DEFAULT_CHART_PATH: &str = "shap_explanation.svg";

/// Fully resolved settings shared by the front-ends.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    pub model_path: PathBuf,
    pub chart_path: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl RiskConfig {
    /// Resolve settings from CLI values, reading `.env` for anything unset.
    pub fn resolve(model: Option<&Path>, chart: Option<&Path>, log_file: Option<&Path>) -> Self {
        dotenvy::dotenv().ok();
        Self::resolve_with_env(model, chart, log_file, std::env::var_os(MODEL_PATH_ENV))
    }

    fn resolve_with_env(
        model: Option<&Path>,
        chart: Option<&Path>,
        log_file: Option<&Path>,
        env_model: Option<OsString>,
    ) -> Self {
        let model_path = model
            .map(Path::to_path_buf)
            .or_else(|| env_model.filter(|v| !v.is_empty()).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));
        Self {
            model_path,
            chart_path: chart
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CHART_PATH)),
            log_file: log_file.map(Path::to_path_buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_environment() {
        let cfg = RiskConfig::resolve_with_env(
            Some(Path::new("a.json")),
            None,
            None,
            Some(OsString::from("b.json")),
        );
        assert_eq!(cfg.model_path, PathBuf::from("a.json"));
        assert_eq!(cfg.chart_path, PathBuf::from(DEFAULT_CHART_PATH));
    }

    #[test]
    fn environment_beats_default() {
        let cfg = RiskConfig::resolve_with_env(None, None, None, Some(OsString::from("b.json")));
        assert_eq!(cfg.model_path, PathBuf::from("b.json"));
    }

    #[test]
    fn empty_environment_falls_back_to_default() {
        let cfg = RiskConfig::resolve_with_env(None, Some(Path::new("c.svg")), None, Some(OsString::new()));
        assert_eq!(cfg.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(cfg.chart_path, PathBuf::from("c.svg"));
    }
}
