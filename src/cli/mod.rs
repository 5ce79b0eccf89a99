//! Command-line parsing for the risk predictor.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the model and explanation code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "risk",
    version,
    about = "Non-small cell lung cancer risk prediction from gene expression levels, with SHAP explanations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive TUI (the default when no subcommand is given).
    Tui(TuiArgs),
    /// Evaluate one set of gene expression levels and print the risk and its explanation.
    Predict(PredictArgs),
    /// List the gene features in model order with their ranges and defaults.
    Features,
}

/// Model selection shared by all model-backed commands.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// XGBoost JSON model file (overrides RISK_MODEL_PATH; default: XGBoost.json).
    #[arg(short = 'm', long, value_name = "JSON")]
    pub model: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Where `s` saves the explanation chart (default: shap_explanation.svg).
    #[arg(long, value_name = "SVG")]
    pub chart: Option<PathBuf>,

    /// Append log output to this file (the TUI never logs to the terminal).
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Override one gene expression level, e.g. `--set CYBB=6000`. Repeatable.
    #[arg(short = 's', long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, f64)>,

    /// JSON object of `{ "GENE": value }` overrides, applied before `--set`.
    #[arg(long, value_name = "JSON")]
    pub inputs: Option<PathBuf>,

    /// Write the explanation chart as an SVG image.
    #[arg(long, value_name = "SVG")]
    pub chart: Option<PathBuf>,

    /// Write the full assessment (inputs, prediction, attribution) as JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Skip the terminal contribution chart.
    #[arg(long)]
    pub no_plot: bool,

    /// Bar width (columns) of the terminal contribution chart.
    #[arg(long, default_value_t = 40)]
    pub width: usize,
}

/// Parse `NAME=VALUE`. Names may themselves contain `-` and `.`, so split on the last `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing feature name in '{raw}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value in '{raw}': {e}"))?;
    if !value.is_finite() {
        return Err(format!("value in '{raw}' must be finite"));
    }
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_assignments() {
        assert_eq!(parse_assignment("CYBB=6000").unwrap(), ("CYBB".to_string(), 6000.0));
        assert_eq!(
            parse_assignment("CTD-3080P12.3 = 2.5").unwrap(),
            ("CTD-3080P12.3".to_string(), 2.5)
        );
        assert!(parse_assignment("CYBB").is_err());
        assert!(parse_assignment("=1").is_err());
        assert!(parse_assignment("CYBB=abc").is_err());
        assert!(parse_assignment("CYBB=inf").is_err());
    }

    #[test]
    fn predict_accepts_repeated_sets() {
        let cli = Cli::parse_from(["risk", "predict", "--set", "ANLN=1", "-s", "MARCO=2", "--no-plot"]);
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.set.len(), 2);
        assert!(args.no_plot);
        assert_eq!(args.width, 40);
    }
}
