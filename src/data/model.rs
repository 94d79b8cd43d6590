use std::fmt;

use crate::error::{EvalError, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Labels are collected into `BTreeSet`s downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Infer the type of a raw text cell: integer, float, bool, then string.
    pub fn infer(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        match s {
            "true" | "True" => CellValue::Bool(true),
            "false" | "False" => CellValue::Bool(false),
            _ => CellValue::String(s.to_string()),
        }
    }

    /// Numeric view used for score columns.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Key under which equal ids compare equal: integral floats become
    /// integers, so `7` and `7.0` join.
    pub fn key(&self) -> CellValue {
        match self {
            CellValue::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                CellValue::Integer(*v as i64)
            }
            other => other.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Column / Table
// ---------------------------------------------------------------------------

/// One named column of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    fn promote_numeric(&mut self) {
        let has = |f: fn(&CellValue) -> bool| self.values.iter().any(f);
        let mixed = has(|v| matches!(v, CellValue::Float(_)))
            && has(|v| matches!(v, CellValue::Integer(_)))
            && !has(|v| !matches!(v, CellValue::Float(_) | CellValue::Integer(_) | CellValue::Null));
        if !mixed {
            return;
        }
        for v in &mut self.values {
            if let CellValue::Integer(i) = *v {
                *v = CellValue::Float(i as f64);
            }
        }
    }
}

/// Ordered, row-aligned named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Build a table, checking that every column has the same length.
    /// Columns mixing integers and floats are promoted to floats.
    pub fn new(mut columns: Vec<Column>) -> Result<Self, String> {
        let rows = columns.first().map_or(0, |c| c.values.len());
        if let Some(bad) = columns.iter().find(|c| c.values.len() != rows) {
            return Err(format!(
                "column '{}' has {} values, expected {rows}",
                bad.name,
                bad.values.len()
            ));
        }
        for column in &mut columns {
            column.promote_numeric();
        }
        Ok(Table { columns, rows })
    }

    /// Build from a header and row-major records of equal width.
    pub fn from_rows(headers: Vec<String>, records: Vec<Vec<CellValue>>) -> Result<Self, String> {
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column {
                name,
                values: Vec::with_capacity(records.len()),
            })
            .collect();
        for (row_no, record) in records.into_iter().enumerate() {
            if record.len() != columns.len() {
                return Err(format!(
                    "row {row_no} has {} fields, header has {}",
                    record.len(),
                    columns.len()
                ));
            }
            for (col, value) in columns.iter_mut().zip(record) {
                col.values.push(value);
            }
        }
        Table::new(columns)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| EvalError::MissingColumn {
                column: name.to_string(),
                available: self.column_names(),
            })
    }

    /// A copy of the table without the named columns. Names that are absent
    /// are ignored; callers check required columns first.
    pub fn without_columns(&self, names: &[&str]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .filter(|c| !names.contains(&c.name.as_str()))
                .cloned()
                .collect(),
            rows: self.rows,
        }
    }

    /// A copy holding only the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: indices.iter().map(|&i| c.values[i].clone()).collect(),
                })
                .collect(),
            rows: indices.len(),
        }
    }
}
