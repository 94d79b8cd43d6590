use std::path::Path;

use crate::config::{EvalConfig, RenderOptions};
use crate::data::extract::{extract_labels, extract_scores, join_by_id};
use crate::data::loader::load_table;
use crate::error::Result;
use crate::eval::{EvalInput, Evaluation, evaluate};
use crate::render::Figure;
use crate::report::Summary;

/// Result of one run.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub evaluation: Evaluation,
    pub summary: Summary,
}

impl Outcome {
    pub fn area(&self) -> f64 {
        self.evaluation.area
    }
}

/// Load, extract, evaluate and render: one forward pass.
pub fn run(
    truth_path: &Path,
    predicted_path: &Path,
    output_path: &Path,
    config: &EvalConfig,
    render: RenderOptions,
) -> Result<Outcome> {
    let truth = load_table(truth_path)?;
    let mut predicted = load_table(predicted_path)?;

    let labels = extract_labels(&truth, &config.truth_column)?;
    let mut exclude: Vec<&str> = Vec::new();
    if let Some(id) = config.id_column.as_deref() {
        predicted = join_by_id(&truth, &predicted, id)?;
        exclude.push(id);
    }
    let scores = extract_scores(&predicted, &config.pred_column, &exclude)?;

    let input = EvalInput::new(&labels, &scores, config.tolerance)?;
    log::info!(
        "Evaluating {} rows over classes {:?} (score columns {:?})",
        input.len(),
        input.classes,
        input.class_columns
    );
    let evaluation = evaluate(&input, config.curve, config.tolerance)?;

    Figure::new(&evaluation, render).save(output_path)?;

    let summary = Summary::new(&evaluation, config.tolerance);
    Ok(Outcome {
        evaluation,
        summary,
    })
}
