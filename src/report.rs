use std::path::Path;

use serde::Serialize;

use crate::config::CurveKind;
use crate::error::Result;
use crate::eval::{ClassBreakdown, Evaluation};

/// The single stdout line, e.g. `Area under IMCP curve: 0.7312`.
pub fn format_area(kind: CurveKind, area: f64) -> String {
    format!("Area under {} curve: {area:.4}", kind.label())
}

/// Machine-readable account of one run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub curve: CurveKind,
    pub area: f64,
    pub tolerance: f64,
    pub rows: usize,
    /// Rows whose scores were rescaled to sum to 1.
    pub renormalised_rows: usize,
    pub classes: Vec<ClassBreakdown>,
}

impl Summary {
    pub fn new(evaluation: &Evaluation, tolerance: f64) -> Self {
        Summary {
            curve: evaluation.curve.kind,
            area: evaluation.area,
            tolerance,
            rows: evaluation.rows,
            renormalised_rows: evaluation.renormalised,
            classes: evaluation.classes.clone(),
        }
    }

    /// Write pretty JSON to `path`, or to stderr when `path` is `-`.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if path == Path::new("-") {
            eprintln!("{json}");
        } else {
            std::fs::write(path, json + "\n")?;
        }
        Ok(())
    }
}
