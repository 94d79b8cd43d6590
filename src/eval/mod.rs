//! Imprecision-calibrated multiclass precision (IMCP) curves.
//!
//! Every row is credited with `1 - H`, where `H` is the Hellinger distance
//! between its predicted class distribution and the one-hot truth. The curve
//! lays those credits out in descending order along x in [0, 1]:
//!
//! * MCP gives every row the same width `1/n`.
//! * IMCP gives every class the same total width, so row `i` of class `c`
//!   covers `1/(K * n_c)`.
//!
//! The area under the curve is therefore the (class-balanced) mean credit,
//! 1 for perfect predictions and 0 when no mass ever lands on the truth.

pub mod curve;
pub mod distance;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::CurveKind;
use crate::data::extract::{LabelVector, ScoreMatrix, check_aligned};
use crate::data::model::CellValue;
use crate::error::{EvalError, Result};

pub use curve::Curve;
use curve::NeumaierSum;
use distance::{ensure_prob_vector, row_precision};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Labels resolved to score columns, with one precision credit per row.
#[derive(Debug, Clone)]
pub struct EvalInput {
    /// Class labels, sorted.
    pub classes: Vec<String>,
    /// Score column used for each class.
    pub class_columns: Vec<String>,
    /// Class index of each row.
    pub class_of_row: Vec<usize>,
    /// `1 - Hellinger(truth, prediction)` of each row.
    pub precision: Vec<f64>,
    /// Rows whose raw scores did not sum to 1 within tolerance.
    pub renormalised: usize,
}

impl EvalInput {
    pub fn new(labels: &LabelVector, scores: &ScoreMatrix, tolerance: f64) -> Result<Self> {
        check_tolerance(tolerance)?;
        check_aligned(labels, scores)?;
        if labels.is_empty() {
            return Err(EvalError::EmptyInput);
        }

        let distinct: BTreeSet<&CellValue> = labels.values.iter().collect();
        let classes: Vec<&CellValue> = distinct.into_iter().collect();
        let column_of_class = map_classes(&classes, scores)?;
        let class_index: BTreeMap<&CellValue, usize> =
            classes.iter().enumerate().map(|(i, c)| (*c, i)).collect();

        let mut class_of_row = Vec::with_capacity(labels.len());
        let mut precision = Vec::with_capacity(labels.len());
        let mut renormalised = 0usize;
        for (label, row) in labels.values.iter().zip(&scores.rows) {
            let class = class_index[label];
            let raw_sum: f64 = row.iter().sum();
            if !raw_sum.is_finite() || (raw_sum - 1.0).abs() > tolerance {
                renormalised += 1;
            }
            let p = ensure_prob_vector(row.clone());
            class_of_row.push(class);
            precision.push(row_precision(p[column_of_class[class]]));
        }
        if renormalised > 0 {
            log::warn!(
                "{renormalised} of {} score rows do not sum to 1 (tolerance {tolerance:e}); they were renormalised",
                labels.len()
            );
        }

        Ok(EvalInput {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            class_columns: column_of_class
                .iter()
                .map(|&j| scores.columns[j].clone())
                .collect(),
            class_of_row,
            precision,
            renormalised,
        })
    }

    pub fn len(&self) -> usize {
        self.precision.len()
    }

    pub fn is_empty(&self) -> bool {
        self.precision.is_empty()
    }

    fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for &c in &self.class_of_row {
            counts[c] += 1;
        }
        counts
    }

    /// Width each row covers on the x axis.
    fn weights(&self, kind: CurveKind) -> Vec<f64> {
        let n = self.len() as f64;
        match kind {
            CurveKind::Mcp => vec![1.0 / n; self.len()],
            CurveKind::Imcp => {
                let counts = self.class_counts();
                let k = counts.iter().filter(|&&c| c > 0).count() as f64;
                self.class_of_row
                    .iter()
                    .map(|&c| 1.0 / (k * counts[c] as f64))
                    .collect()
            }
        }
    }
}

/// Resolve each class to a score column: by header (`"2"` or `"..._2"`) when
/// every class has one, otherwise by position.
///
/// Columns left over by the header mapping must look like further classes
/// (same naming, values in [0, 1]); anything else would be renormalised into
/// the class probabilities.
fn map_classes(classes: &[&CellValue], scores: &ScoreMatrix) -> Result<Vec<usize>> {
    let columns = &scores.columns;
    let by_name: Option<Vec<usize>> = classes
        .iter()
        .map(|class| {
            let key = class.to_string();
            let suffix = format!("_{key}");
            columns
                .iter()
                .position(|c| *c == key)
                .or_else(|| columns.iter().position(|c| c.ends_with(&suffix)))
        })
        .collect();

    if let Some(mapping) = by_name {
        // Text in front of each class name ("" for bare headers).
        let prefixes: Vec<&str> = mapping
            .iter()
            .zip(classes)
            .map(|(&j, class)| {
                let c = &columns[j];
                &c[..c.len() - class.to_string().len()]
            })
            .collect();
        let unique: BTreeSet<usize> = mapping.iter().copied().collect();
        if unique.len() == mapping.len() {
            let stray: Vec<String> = (0..columns.len())
                .filter(|j| !unique.contains(j))
                .filter(|&j| !is_extra_class_column(j, scores, classes, &prefixes))
                .map(|j| columns[j].clone())
                .collect();
            if !stray.is_empty() {
                return Err(EvalError::ClassMismatch {
                    classes: classes.len(),
                    columns: columns.len(),
                    names: stray,
                });
            }
            return Ok(mapping);
        }
    }

    if classes.len() == columns.len() {
        log::info!(
            "score columns {columns:?} do not name the classes; mapping them in order to {:?}",
            classes.iter().map(|c| c.to_string()).collect::<Vec<_>>()
        );
        return Ok((0..columns.len()).collect());
    }

    Err(EvalError::ClassMismatch {
        classes: classes.len(),
        columns: columns.len(),
        names: columns.to_vec(),
    })
}

/// A column the header mapping did not use is still a class column when it
/// is named like the mapped ones and only holds probabilities.
fn is_extra_class_column(
    j: usize,
    scores: &ScoreMatrix,
    classes: &[&CellValue],
    prefixes: &[&str],
) -> bool {
    let name = &scores.columns[j];
    let named_like_a_class = prefixes.iter().any(|prefix| {
        let Some(rest) = name.strip_prefix(*prefix) else {
            return false;
        };
        if rest.is_empty() {
            return false;
        }
        if !prefix.is_empty() {
            return true;
        }
        // Bare names: the rest must parse like the labels do.
        let kind = std::mem::discriminant(&CellValue::infer(rest));
        classes
            .iter()
            .any(|c| std::mem::discriminant(*c) == kind)
    });
    named_like_a_class
        && scores
            .rows
            .iter()
            .all(|row| (0.0..=1.0).contains(&row[j]))
}

fn check_tolerance(tolerance: f64) -> Result<()> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(EvalError::InvalidTolerance(tolerance));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Curve and score
// ---------------------------------------------------------------------------

/// The precision curve of `kind`.
pub fn precision_curve(input: &EvalInput, kind: CurveKind, tolerance: f64) -> Result<Curve> {
    check_tolerance(tolerance)?;
    if input.is_empty() {
        return Err(EvalError::EmptyInput);
    }
    Ok(Curve::from_weighted(
        kind,
        &input.precision,
        &input.weights(kind),
        tolerance,
    ))
}

/// Area under the precision curve of `kind`.
pub fn precision_score(input: &EvalInput, kind: CurveKind, tolerance: f64) -> Result<f64> {
    Ok(precision_curve(input, kind, tolerance)?.area(tolerance))
}

/// Per-class summary: how well the rows of one class are predicted.
#[derive(Debug, Clone, Serialize)]
pub struct ClassBreakdown {
    pub label: String,
    pub column: String,
    pub count: usize,
    /// Mean precision credit of the class, i.e. the area of its own curve.
    pub area: f64,
    #[serde(skip)]
    pub curve: Curve,
}

/// Everything derived from one evaluation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub curve: Curve,
    pub area: f64,
    pub classes: Vec<ClassBreakdown>,
    pub rows: usize,
    pub renormalised: usize,
}

/// Build the curve, its area and the per-class breakdown.
pub fn evaluate(input: &EvalInput, kind: CurveKind, tolerance: f64) -> Result<Evaluation> {
    let curve = precision_curve(input, kind, tolerance)?;
    let area = curve.area(tolerance);

    let classes = input
        .classes
        .iter()
        .enumerate()
        .map(|(c, label)| {
            let values: Vec<f64> = input
                .class_of_row
                .iter()
                .zip(&input.precision)
                .filter(|&(&rc, _)| rc == c)
                .map(|(_, &v)| v)
                .collect();
            let weights = vec![1.0 / values.len() as f64; values.len()];
            let class_curve = Curve::from_weighted(kind, &values, &weights, tolerance);
            let mean: NeumaierSum = values.iter().map(|v| v / values.len() as f64).collect();
            ClassBreakdown {
                label: label.clone(),
                column: input.class_columns[c].clone(),
                count: values.len(),
                area: mean.value(),
                curve: class_curve,
            }
        })
        .collect();

    log::debug!(
        "{} curve: {} points, area {area:.6}",
        kind.label(),
        curve.points.len()
    );

    Ok(Evaluation {
        curve,
        area,
        classes,
        rows: input.len(),
        renormalised: input.renormalised,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[i64]) -> LabelVector {
        LabelVector {
            column: "damage_grade".into(),
            values: values.iter().map(|&v| CellValue::Integer(v)).collect(),
        }
    }

    fn scores(columns: &[&str], rows: &[&[f64]]) -> ScoreMatrix {
        ScoreMatrix {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows.iter().map(|r| r.to_vec()).collect(),
        }
    }

    #[test]
    fn perfect_predictions_score_one() {
        let l = labels(&[1, 2, 3, 3, 3]);
        let s = scores(
            &["1", "2", "3"],
            &[
                &[1.0, 0.0, 0.0],
                &[0.0, 1.0, 0.0],
                &[0.0, 0.0, 1.0],
                &[0.0, 0.0, 1.0],
                &[0.0, 0.0, 1.0],
            ],
        );
        let input = EvalInput::new(&l, &s, 1e-7).unwrap();
        for kind in [CurveKind::Imcp, CurveKind::Mcp] {
            let area = precision_score(&input, kind, 1e-7).unwrap();
            assert!((area - 1.0).abs() < 1e-12, "{kind:?}: {area}");
        }
    }

    #[test]
    fn imcp_balances_classes() {
        // Class 1 is always right, class 2 (three rows) always wrong.
        let l = labels(&[1, 2, 2, 2]);
        let s = scores(
            &["1", "2"],
            &[&[1.0, 0.0], &[1.0, 0.0], &[1.0, 0.0], &[1.0, 0.0]],
        );
        let input = EvalInput::new(&l, &s, 1e-7).unwrap();
        let imcp = precision_score(&input, CurveKind::Imcp, 1e-7).unwrap();
        let mcp = precision_score(&input, CurveKind::Mcp, 1e-7).unwrap();
        assert!((imcp - 0.5).abs() < 1e-12);
        assert!((mcp - 0.25).abs() < 1e-12);
    }

    #[test]
    fn columns_map_by_suffix_and_order_independent() {
        let l = labels(&[1, 2]);
        let s = scores(&["grade_2", "grade_1"], &[&[0.0, 1.0], &[1.0, 0.0]]);
        let input = EvalInput::new(&l, &s, 1e-7).unwrap();
        assert_eq!(input.class_columns, vec!["grade_1".to_string(), "grade_2".to_string()]);
        assert_eq!(input.precision, vec![1.0, 1.0]);
    }

    #[test]
    fn unnamed_columns_map_by_position() {
        let l = labels(&[5, 9]);
        let s = scores(&["a", "b"], &[&[1.0, 0.0], &[0.0, 1.0]]);
        let input = EvalInput::new(&l, &s, 1e-7).unwrap();
        assert_eq!(input.classes, vec!["5".to_string(), "9".to_string()]);
        assert_eq!(input.precision, vec![1.0, 1.0]);
    }

    #[test]
    fn too_few_columns_is_a_class_mismatch() {
        let l = labels(&[1, 2, 3]);
        let s = scores(&["a", "b"], &[&[1.0, 0.0], &[0.0, 1.0], &[0.5, 0.5]]);
        assert!(matches!(
            EvalInput::new(&l, &s, 1e-7),
            Err(EvalError::ClassMismatch { classes: 3, columns: 2, .. })
        ));
    }

    #[test]
    fn unmapped_non_class_column_is_a_class_mismatch() {
        let l = labels(&[1, 2]);
        let s = scores(
            &["building_id", "1", "2"],
            &[&[100.0, 1.0, 0.0], &[101.0, 0.0, 1.0]],
        );
        let err = EvalInput::new(&l, &s, 1e-7).unwrap_err();
        assert!(
            matches!(err, EvalError::ClassMismatch { ref names, .. } if names == &["building_id".to_string()])
        );
    }

    #[test]
    fn unmapped_column_with_out_of_range_values_is_rejected() {
        let l = labels(&[1, 2]);
        let s = scores(&["1", "2", "7"], &[&[1.0, 0.0, 0.0], &[0.0, 1.0, 3.0]]);
        assert!(matches!(
            EvalInput::new(&l, &s, 1e-7),
            Err(EvalError::ClassMismatch { .. })
        ));
    }

    #[test]
    fn unobserved_class_columns_are_kept() {
        // No row of class 3 in the truth, but its probability column stays.
        let l = labels(&[1, 2]);
        let s = scores(
            &["grade_1", "grade_2", "grade_3"],
            &[&[0.5, 0.0, 0.5], &[0.0, 1.0, 0.0]],
        );
        let input = EvalInput::new(&l, &s, 1e-7).unwrap();
        assert_eq!(input.renormalised, 0);
        assert!((input.precision[0] - (1.0 - (1.0 - 0.5f64.sqrt()).sqrt())).abs() < 1e-12);
        let bare = scores(&["1", "2", "3"], &[&[0.5, 0.0, 0.5], &[0.0, 1.0, 0.0]]);
        assert!(EvalInput::new(&l, &bare, 1e-7).is_ok());
    }

    #[test]
    fn unnormalised_rows_are_counted() {
        let l = labels(&[1, 2]);
        let s = scores(&["1", "2"], &[&[2.0, 0.0], &[0.5, 0.5]]);
        let input = EvalInput::new(&l, &s, 1e-7).unwrap();
        assert_eq!(input.renormalised, 1);
        assert_eq!(input.precision[0], 1.0);
    }

    #[test]
    fn bad_tolerance_and_empty_input() {
        let l = labels(&[]);
        let s = scores(&["1"], &[]);
        assert!(matches!(
            EvalInput::new(&l, &s, -1.0),
            Err(EvalError::InvalidTolerance(_))
        ));
        assert!(matches!(EvalInput::new(&l, &s, 1e-7), Err(EvalError::EmptyInput)));
    }

    #[test]
    fn breakdown_areas_average_to_imcp() {
        let l = labels(&[1, 1, 2]);
        let s = scores(&["1", "2"], &[&[0.81, 0.19], &[0.25, 0.75], &[0.0, 1.0]]);
        let input = EvalInput::new(&l, &s, 1e-7).unwrap();
        let ev = evaluate(&input, CurveKind::Imcp, 1e-7).unwrap();
        assert_eq!(ev.classes.len(), 2);
        assert_eq!(ev.classes[0].count, 2);
        let mean = (ev.classes[0].area + ev.classes[1].area) / 2.0;
        assert!((mean - ev.area).abs() < 1e-9);
        assert!(ev.area > 0.0 && ev.area < 1.0);
    }
}
