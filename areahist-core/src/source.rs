use arrow::array::{Array, Float64Array};
use arrow::datatypes::DataType;
use areahist_common::{HistError, Result};
use log::debug;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

const BATCH_SIZE: usize = 65536;

/// Parse numbers separated by whitespace, commas or semicolons. `#` comments run to end of line.
pub fn parse_samples(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or("");
        for token in content
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .filter(|t| !t.is_empty())
        {
            let v: f64 = token.parse().map_err(|_| {
                HistError::invalid(format!("line {}: not a number: {token:?}", line_no + 1))
            })?;
            out.push(v);
        }
    }
    Ok(out)
}

pub fn read_text_samples(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)?;
    let samples = parse_samples(&text)?;
    debug!("read {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Read one numeric column as f64. Nulls are skipped.
pub fn read_parquet_column(path: &Path, column: &str) -> Result<Vec<f64>> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let idx = schema
        .fields()
        .iter()
        .position(|f| f.name() == column)
        .ok_or_else(|| {
            HistError::invalid(format!("column {column:?} not found in {}", path.display()))
        })?;
    let data_type = schema.field(idx).data_type();
    if !data_type.is_numeric() {
        return Err(HistError::invalid(format!(
            "column {column:?} has non-numeric type {data_type}"
        )));
    }
    let mask = ProjectionMask::roots(builder.parquet_schema(), [idx]);
    let reader = builder
        .with_projection(mask)
        .with_batch_size(BATCH_SIZE)
        .build()?;

    let mut values = Vec::new();
    for batch in reader {
        let batch = batch?;
        let col = arrow::compute::cast(batch.column(0), &DataType::Float64)?;
        let arr = col
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| HistError::Other("cast to Float64 produced another array type".into()))?;
        values.reserve(arr.len() - arr.null_count());
        values.extend(arr.iter().flatten());
    }
    debug!(
        "read {} values from column {column:?} of {}",
        values.len(),
        path.display()
    );
    Ok(values)
}

pub fn is_parquet(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("parquet")
}

/// Expand an input argument: an existing file, or a glob pattern matching files.
pub fn resolve_inputs(input: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(input);
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let entries =
        glob::glob(input).map_err(|e| HistError::invalid(format!("bad pattern {input:?}: {e}")))?;
    let mut results: Vec<PathBuf> = entries.flatten().filter(|p| p.is_file()).collect();
    results.sort();
    if results.is_empty() {
        return Err(HistError::invalid(format!("no input files match {input:?}")));
    }
    Ok(results)
}

/// Read and concatenate samples from every file. Parquet files need a column name.
pub fn read_samples(paths: &[PathBuf], column: Option<&str>) -> Result<Vec<f64>> {
    let mut samples = Vec::new();
    for path in paths {
        if is_parquet(path) {
            let column = column.ok_or_else(|| {
                HistError::invalid(format!("{} is a Parquet file; pass a column", path.display()))
            })?;
            samples.extend(read_parquet_column(path, column)?);
        } else {
            samples.extend(read_text_samples(path)?);
        }
    }
    Ok(samples)
}

/// `(1 + cos(2πr)) / 2` for uniform `r`: mass piles up near 0 and 1, so narrow outer
/// bins show the density much better than equal-width ones.
pub fn demo_samples(count: usize, seed: Option<u64>) -> Vec<f64> {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    (0..count)
        .map(|_| {
            let r: f64 = rng.random();
            (r * PI * 2.0).cos() * 0.5 + 0.5
        })
        .collect()
}
