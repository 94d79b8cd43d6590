/// Data layer: core types, loading, and column extraction.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table   │  named columns of typed cells
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ extract  │  label column / score columns → LabelVector, ScoreMatrix
///   └──────────┘
/// ```

pub mod extract;
pub mod loader;
pub mod model;
