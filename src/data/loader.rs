use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, Table};
use crate::error::EvalError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`             – comma-separated text with a header row
/// * `.tsv` / `.tab`    – tab-separated text with a header row
/// * `.json`            – `[{ "col": value, ... }, ...]`
/// * `.parquet` / `.pq` – flat primitive columns
///
/// Anything else is read as comma-separated text.
pub fn load_table(path: &Path) -> Result<Table, EvalError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "tsv" | "tab" => load_delimited(path, b'\t'),
        _ => load_delimited(path, b','),
    }
    .map_err(|e| EvalError::load(path, e))?;

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        table.len(),
        table.column_names(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Header row with column names; each cell is typed on its own
/// (see [`CellValue::infer`]).
fn load_delimited(path: &Path, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .context("opening delimited file")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        bail!("missing header row");
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;
        records.push(record.iter().map(CellValue::infer).collect());
    }

    Table::from_rows(headers, records).map_err(anyhow::Error::msg)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "damage_grade": 2, "building_id": 802906 },
///   ...
/// ]
/// ```
///
/// Column order follows the keys of the first record.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let headers: Vec<String> = match records.first() {
        Some(first) => first
            .as_object()
            .context("Row 0 is not a JSON object")?
            .keys()
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        if obj.len() != headers.len() {
            bail!("Row {i} has {} keys, expected {}", obj.len(), headers.len());
        }
        let row = headers
            .iter()
            .map(|h| {
                obj.get(h)
                    .map(json_to_cell)
                    .with_context(|| format!("Row {i}: missing key '{h}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }

    Table::from_rows(headers, rows).map_err(anyhow::Error::msg)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat primitive columns, as written by both
/// **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<Column> = headers
        .iter()
        .map(|name| Column {
            name: name.clone(),
            values: Vec::new(),
        })
        .collect();

    for (batch_no, batch_result) in reader.enumerate() {
        let batch = batch_result.context("reading parquet record batch")?;
        if batch_no == 0 && log::log_enabled!(log::Level::Debug) {
            let head = batch.slice(0, batch.num_rows().min(5));
            if let Ok(preview) = arrow::util::pretty::pretty_format_batches(&[head]) {
                log::debug!("{}:\n{preview}", path.display());
            }
        }
        for (col_idx, column) in columns.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            for row in 0..batch.num_rows() {
                let value = extract_cell(array, row)
                    .with_context(|| format!("column '{}', row {row}", column.name))?;
                column.values.push(value);
            }
        }
    }

    Table::new(columns).map_err(anyhow::Error::msg)
}

// -- Parquet / Arrow helpers --

macro_rules! downcast {
    ($col:expr, $ty:ty) => {
        $col.as_any()
            .downcast_ref::<$ty>()
            .context(concat!("expected ", stringify!($ty)))?
    };
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => CellValue::String(downcast!(col, StringArray).value(row).to_string()),
        DataType::LargeUtf8 => {
            CellValue::String(downcast!(col, LargeStringArray).value(row).to_string())
        }
        DataType::Int32 => CellValue::Integer(downcast!(col, Int32Array).value(row) as i64),
        DataType::Int64 => CellValue::Integer(downcast!(col, Int64Array).value(row)),
        DataType::Float32 => CellValue::Float(downcast!(col, Float32Array).value(row) as f64),
        DataType::Float64 => CellValue::Float(downcast!(col, Float64Array).value(row)),
        DataType::Boolean => CellValue::Bool(downcast!(col, BooleanArray).value(row)),
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn csv_cells_are_typed() {
        let f = write_temp(".csv", "building_id,damage_grade,note\n10,2,a\n11,3,\n");
        let t = load_table(f.path()).unwrap();
        assert_eq!(t.len(), 2);
        let grade = t.column("damage_grade").unwrap();
        assert_eq!(grade.values, vec![CellValue::Integer(2), CellValue::Integer(3)]);
        assert_eq!(t.column("note").unwrap().values[1], CellValue::Null);
    }

    #[test]
    fn tsv_uses_tab_delimiter() {
        let f = write_temp(".tsv", "a\tb\n0.5\t0.5\n");
        let t = load_table(f.path()).unwrap();
        assert_eq!(t.column_names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(t.column("b").unwrap().values[0], CellValue::Float(0.5));
    }

    #[test]
    fn json_records_keep_key_order() {
        let f = write_temp(
            ".json",
            r#"[{"z": 1, "a": 0.5}, {"z": 2, "a": 0.25}]"#,
        );
        let t = load_table(f.path()).unwrap();
        assert_eq!(t.column_names(), vec!["z".to_string(), "a".to_string()]);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_table(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, EvalError::Load { .. }));
    }

    #[test]
    fn ragged_csv_is_a_load_error() {
        let f = write_temp(".csv", "a,b\n1,2\n3\n");
        assert!(matches!(
            load_table(f.path()),
            Err(EvalError::Load { .. })
        ));
    }
}
