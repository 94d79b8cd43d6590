use std::collections::HashMap;

use super::model::{CellValue, Table};
use crate::error::{EvalError, Result};

// ---------------------------------------------------------------------------
// Extracted views
// ---------------------------------------------------------------------------

/// Ground-truth class per row.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVector {
    pub column: String,
    pub values: Vec<CellValue>,
}

impl LabelVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Per-row, per-class scores. `rows[i][j]` is the score of row `i` for
/// column `columns[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl ScoreMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Select the label column. Empty cells are rejected.
pub fn extract_labels(table: &Table, column: &str) -> Result<LabelVector> {
    let col = table.column(column)?;
    if let Some(row) = col.values.iter().position(CellValue::is_null) {
        return Err(EvalError::MissingLabel {
            row,
            column: column.to_string(),
        });
    }
    Ok(LabelVector {
        column: column.to_string(),
        values: col.values.clone(),
    })
}

/// Every column except `pred_column` and `exclude` becomes a score column.
///
/// `pred_column` must be present: a prediction table without it is most
/// likely the wrong file, and keeping it would score the predicted label as
/// a class probability.
pub fn extract_scores(table: &Table, pred_column: &str, exclude: &[&str]) -> Result<ScoreMatrix> {
    table.column(pred_column)?;

    let mut dropped = vec![pred_column];
    dropped.extend_from_slice(exclude);
    let scores = table.without_columns(&dropped);
    if scores.columns().is_empty() {
        return Err(EvalError::NoScoreColumns {
            dropped: dropped.iter().map(|s| s.to_string()).collect(),
        });
    }

    let mut rows = vec![Vec::with_capacity(scores.columns().len()); scores.len()];
    for col in scores.columns() {
        for (row, value) in col.values.iter().enumerate() {
            let score = value.as_f64().ok_or_else(|| EvalError::InvalidScore {
                row,
                column: col.name.clone(),
                value: value.to_string(),
            })?;
            rows[row].push(score);
        }
    }

    Ok(ScoreMatrix {
        columns: scores.column_names(),
        rows,
    })
}

/// Reorder `pred` so that its rows follow the order of `id_column` in
/// `truth`. Extra prediction rows are dropped.
pub fn join_by_id(truth: &Table, pred: &Table, id_column: &str) -> Result<Table> {
    let truth_ids = truth.column(id_column)?;
    let pred_ids = pred.column(id_column)?;

    let mut position: HashMap<CellValue, usize> = HashMap::with_capacity(pred_ids.values.len());
    for (i, id) in pred_ids.values.iter().enumerate() {
        if position.insert(id.key(), i).is_some() {
            return Err(EvalError::DuplicateId {
                id: id.to_string(),
                table: "prediction",
            });
        }
    }

    let mut seen = std::collections::HashSet::with_capacity(truth_ids.values.len());
    let mut order = Vec::with_capacity(truth_ids.values.len());
    for id in &truth_ids.values {
        let key = id.key();
        let idx = position
            .get(&key)
            .copied()
            .ok_or_else(|| EvalError::MissingId { id: id.to_string() })?;
        if !seen.insert(key) {
            return Err(EvalError::DuplicateId {
                id: id.to_string(),
                table: "truth",
            });
        }
        order.push(idx);
    }

    let extra = pred.len() - order.len();
    if extra > 0 {
        log::warn!("{extra} prediction rows have no matching '{id_column}' in the truth table");
    }
    Ok(pred.select_rows(&order))
}

/// Positional alignment needs equal row counts.
pub fn check_aligned(labels: &LabelVector, scores: &ScoreMatrix) -> Result<()> {
    if labels.len() != scores.len() {
        return Err(EvalError::RowCountMismatch {
            truth: labels.len(),
            predicted: scores.len(),
        });
    }
    Ok(())
}
