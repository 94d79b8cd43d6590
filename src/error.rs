use std::path::PathBuf;

use thiserror::Error;

/// Failure kinds of the evaluation pipeline, one family per stage.
#[derive(Debug, Error)]
pub enum EvalError {
    // -- load --
    #[error("failed to load table from {}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // -- extract --
    #[error("column '{column}' not found (available: {available:?})")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
    #[error("row {row}: label column '{column}' is empty")]
    MissingLabel { row: usize, column: String },
    #[error("row {row}: score column '{column}' holds non-numeric value '{value}'")]
    InvalidScore {
        row: usize,
        column: String,
        value: String,
    },
    #[error("prediction table has no score columns left after dropping {dropped:?}")]
    NoScoreColumns { dropped: Vec<String> },
    #[error("truth table has {truth} rows but prediction table has {predicted}")]
    RowCountMismatch { truth: usize, predicted: usize },
    #[error("id '{id}' from the truth table has no prediction row")]
    MissingId { id: String },
    #[error("id '{id}' appears more than once in the {table} table")]
    DuplicateId { id: String, table: &'static str },

    // -- evaluate --
    #[error("{classes} classes in the labels cannot be matched to {columns} score columns (unmatched: {names:?})")]
    ClassMismatch {
        classes: usize,
        columns: usize,
        names: Vec<String>,
    },
    #[error("no rows to evaluate")]
    EmptyInput,
    #[error("tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),

    // -- render --
    #[error("unsupported image format '{extension}' (use png, jpg, bmp or svg)")]
    UnsupportedImage { extension: String },
    #[error("output directory {} does not exist", .0.display())]
    OutputDir(PathBuf),
    #[error("failed to render plot: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = EvalError> = std::result::Result<T, E>;

impl EvalError {
    pub(crate) fn load(path: &std::path::Path, source: anyhow::Error) -> Self {
        EvalError::Load {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}
