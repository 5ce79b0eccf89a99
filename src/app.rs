//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds the feature schema and loads the model (once)
//! - runs the assessment pipeline
//! - prints reports/plots or hands off to the TUI
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, PredictArgs, TuiArgs};
use crate::config::RiskConfig;
use crate::domain::FeatureSchema;
use crate::error::AppError;
use crate::logging::LogTarget;
use crate::model::RiskModel;

pub mod pipeline;

/// Entry point for the `risk` binary.
pub fn run() -> Result<(), AppError> {
    // We want `risk` and `risk -m model.json` to behave like `risk tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Predict(args) => handle_predict(args),
        Command::Features => handle_features(),
    }
}

/// Build the schema (aborting on a names/defaults mismatch) and load the model.
///
/// Both happen before any output is produced, so configuration errors never
/// leave a half-drawn interface behind.
pub fn load_model(config: &RiskConfig) -> Result<RiskModel, AppError> {
    let schema = FeatureSchema::builtin()?;
    RiskModel::load(&config.model_path, schema)
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let config = RiskConfig::resolve(
        args.model.model.as_deref(),
        args.chart.as_deref(),
        args.log_file.as_deref(),
    );
    match &config.log_file {
        Some(path) => crate::logging::init(LogTarget::File(path))?,
        None => crate::logging::init(LogTarget::Discard)?,
    }

    let model = load_model(&config)?;
    crate::tui::run(&model, &config)
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    crate::logging::init(LogTarget::Stderr)?;
    let config = RiskConfig::resolve(args.model.model.as_deref(), args.chart.as_deref(), None);
    let model = load_model(&config)?;
    let schema = model.schema();

    let mut features = match &args.inputs {
        Some(path) => crate::io::read_inputs_json(path, schema)?,
        None => schema.default_vector(),
    };
    for (name, value) in &args.set {
        features.set_named(schema, name, *value)?;
    }

    let assessment = pipeline::assess(&model, &features)?;

    println!("{}", crate::report::format_input_table(schema, &assessment.inputs));
    println!("{}", crate::report::format_assessment(&assessment.prediction));
    println!("{}", crate::report::format_attribution_table(&assessment.attribution));
    if !args.no_plot {
        println!(
            "{}",
            crate::plot::render_contribution_bars(&assessment.attribution, args.width)
        );
    }

    if let Some(path) = &args.chart {
        crate::plot::write_attribution_svg(path, &assessment.attribution, crate::plot::SVG_SIZE)?;
        log::info!("wrote explanation chart to {}", path.display());
    }
    if let Some(path) = &args.export {
        crate::io::write_assessment_json(path, &assessment, model.source())?;
        log::info!("wrote assessment to {}", path.display());
    }

    Ok(())
}

fn handle_features() -> Result<(), AppError> {
    let schema = FeatureSchema::builtin()?;
    println!("{}", crate::report::format_feature_schema(&schema));
    Ok(())
}

/// Rewrite argv so `risk` defaults to `risk tui`.
///
/// Rules:
/// - `risk`                       -> `risk tui`
/// - `risk -m model.json ...`     -> `risk tui -m model.json ...`
/// - `risk --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "predict" | "features");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(argv(&["risk"])), argv(&["risk", "tui"]));
    }

    #[test]
    fn leading_flags_go_to_tui() {
        assert_eq!(
            rewrite_args(argv(&["risk", "-m", "x.json"])),
            argv(&["risk", "tui", "-m", "x.json"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        assert_eq!(rewrite_args(argv(&["risk", "predict"])), argv(&["risk", "predict"]));
        assert_eq!(rewrite_args(argv(&["risk", "--help"])), argv(&["risk", "--help"]));
    }

    #[test]
    fn missing_model_fails_before_any_output() {
        let config = RiskConfig {
            model_path: "does/not/exist.json".into(),
            chart_path: "chart.svg".into(),
            log_file: None,
        };
        let err = load_model(&config).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_MODEL);
    }
}
