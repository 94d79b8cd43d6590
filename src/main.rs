use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use imcp_curve::config::{
    CurveKind, DEFAULT_PRED_COLUMN, DEFAULT_TOLERANCE, DEFAULT_TRUTH_COLUMN, EvalConfig,
    RenderOptions,
};
use imcp_curve::pipeline;
use imcp_curve::report::format_area;

#[derive(Debug, Clone, ValueEnum)]
enum Curve {
    Imcp,
    Mcp,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Plot the IMCP curve of classifier scores and report its area")]
struct Cli {
    /// Truth table (CSV/TSV/JSON/Parquet) with the label column
    original_data_path: PathBuf,
    /// Prediction table: predicted-label column plus one score column per class
    predicted_data_path: PathBuf,
    /// Where to write the plot (png, jpg, bmp or svg)
    output_plot_path: PathBuf,
    /// Label column of the truth table
    #[arg(long, default_value = DEFAULT_TRUTH_COLUMN)]
    truth_column: String,
    /// Predicted-label column of the prediction table (not a score column)
    #[arg(long, default_value = DEFAULT_PRED_COLUMN)]
    pred_column: String,
    /// Join rows on this column instead of by position
    #[arg(long)]
    id_column: Option<String>,
    /// Absolute tolerance for the curve and its area
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f64,
    /// Curve type: imcp (class-balanced) or mcp (row-weighted)
    #[arg(long, value_enum, default_value = "imcp")]
    curve: Curve,
    /// Also draw one curve per class
    #[arg(long, default_value_t = false)]
    per_class: bool,
    /// Plot width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,
    /// Plot height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,
    /// TrueType font for plot text
    #[arg(long, value_name = "font.ttf")]
    font: Option<PathBuf>,
    /// Write a JSON summary to this path ('-' for stderr)
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = EvalConfig {
        truth_column: cli.truth_column,
        pred_column: cli.pred_column,
        id_column: cli.id_column,
        tolerance: cli.tolerance,
        curve: match cli.curve {
            Curve::Imcp => CurveKind::Imcp,
            Curve::Mcp => CurveKind::Mcp,
        },
    };
    let render = RenderOptions {
        width: cli.width,
        height: cli.height,
        per_class: cli.per_class,
        font: cli.font,
    };

    let outcome = pipeline::run(
        &cli.original_data_path,
        &cli.predicted_data_path,
        &cli.output_plot_path,
        &config,
        render,
    )
    .with_context(|| {
        format!(
            "failed to evaluate {} against {}",
            cli.predicted_data_path.display(),
            cli.original_data_path.display()
        )
    })?;

    if let Some(path) = &cli.summary {
        outcome
            .summary
            .write(path)
            .with_context(|| format!("writing summary to {}", path.display()))?;
    }

    println!("{}", format_area(config.curve, outcome.area()));
    Ok(())
}
