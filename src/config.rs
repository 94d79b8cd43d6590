use std::path::PathBuf;

use serde::Serialize;

pub const DEFAULT_TRUTH_COLUMN: &str = "damage_grade";
pub const DEFAULT_PRED_COLUMN: &str = "damage_grade_pred";
pub const DEFAULT_TOLERANCE: f64 = 1e-7;

/// Which precision curve to build.
///
/// * `Imcp` – every class carries the same total weight, regardless of size.
/// * `Mcp`  – every row carries the same weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    #[default]
    Imcp,
    Mcp,
}

impl CurveKind {
    pub fn label(self) -> &'static str {
        match self {
            CurveKind::Imcp => "IMCP",
            CurveKind::Mcp => "MCP",
        }
    }
}

/// Column names and numeric settings for one evaluation run.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Label column of the truth table.
    pub truth_column: String,
    /// Predicted-label column of the prediction table; dropped before scoring.
    pub pred_column: String,
    /// Optional key present in both tables; rows are joined on it.
    pub id_column: Option<String>,
    /// Absolute tolerance for curve simplification and area clamping.
    pub tolerance: f64,
    pub curve: CurveKind,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            truth_column: DEFAULT_TRUTH_COLUMN.to_string(),
            pred_column: DEFAULT_PRED_COLUMN.to_string(),
            id_column: None,
            tolerance: DEFAULT_TOLERANCE,
            curve: CurveKind::default(),
        }
    }
}

/// How the curve is drawn.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    /// Also draw one curve per class.
    pub per_class: bool,
    /// TrueType font for captions and labels; common system font locations are tried if unset.
    pub font: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            per_class: false,
            font: None,
        }
    }
}
