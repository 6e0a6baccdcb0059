//! Table I/O
//!
//! Raw transactions travel as CSV through typed `csv` records. Everything
//! columnar (prediction registers, aggregated sales, predictions) travels as
//! Arrow record batches stored in Parquet. Outputs are staged in a temp file
//! next to the destination and renamed into place, so a failed run leaves
//! nothing behind.

use crate::error::{PipelineError, Result};
use crate::models::{
    AggregatedSales, SalesKey, Transaction, KEY_COLUMNS, TARGET_COLUMN, TRANSACTION_COLUMNS,
};
use arrow::array::{ArrayRef, AsArray, Float64Array, Int64Array};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use csv::{ReaderBuilder, WriterBuilder};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use std::fs::{self, File};
use std::io::{ErrorKind, Seek};
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Open an input file, reporting a missing file as `InputNotFound`
pub fn open_input(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PipelineError::InputNotFound { path: path.to_path_buf() },
        _ => PipelineError::Io(e),
    })
}

/// Run `write` against a temp file in the destination directory, then move it into place
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut staged = NamedTempFile::new_in(dir)?;
    write(staged.as_file_mut())?;
    staged.as_file_mut().sync_all()?;
    staged.persist(path).map_err(|e| PipelineError::Io(e.error))?;
    Ok(())
}

pub fn is_parquet(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"))
}

// ---------------------------------------------------------------------------
// Raw transactions (CSV)
// ---------------------------------------------------------------------------

pub fn read_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let file = open_input(path)?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let headers = reader.headers()?.clone();
    for column in TRANSACTION_COLUMNS {
        if !headers.iter().any(|h| h.trim() == column) {
            return Err(PipelineError::missing_column(column));
        }
    }

    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|e| PipelineError::Schema(format!("row {}: {}", i + 1, e)))
        })
        .collect()
}

pub fn write_transactions(path: &Path, rows: &[Transaction]) -> Result<()> {
    write_atomically(path, |file| {
        let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
        if rows.is_empty() {
            // serialize() only emits the header alongside the first row
            writer.write_record(TRANSACTION_COLUMNS)?;
        }
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Columnar tables (Arrow / Parquet)
// ---------------------------------------------------------------------------

fn key_fields() -> Vec<Field> {
    KEY_COLUMNS
        .iter()
        .map(|name| Field::new(*name, DataType::Int64, false))
        .collect()
}

fn key_columns(keys: &[SalesKey]) -> Vec<ArrayRef> {
    let column = |f: fn(&SalesKey) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from_iter_values(keys.iter().map(f)))
    };
    vec![
        column(|k| k.store_id),
        column(|k| k.year),
        column(|k| k.month),
        column(|k| k.day),
        column(|k| k.weekday),
    ]
}

pub fn registers_to_batch(registers: &[SalesKey]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(key_fields()));
    Ok(RecordBatch::try_new(schema, key_columns(registers))?)
}

pub fn aggregated_to_batch(rows: &[AggregatedSales]) -> Result<RecordBatch> {
    let mut fields = key_fields();
    fields.push(Field::new(TARGET_COLUMN, DataType::Float64, false));

    let keys: Vec<SalesKey> = rows.iter().map(|r| r.key).collect();
    let mut columns = key_columns(&keys);
    columns.push(Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.total_sales))));

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Read an aggregated sales table back into typed rows
pub fn batch_to_aggregated(batch: &RecordBatch) -> Result<Vec<AggregatedSales>> {
    let mut keys = Vec::with_capacity(KEY_COLUMNS.len());
    for name in KEY_COLUMNS {
        keys.push(column_f64(batch, name)?);
    }
    let totals = column_f64(batch, TARGET_COLUMN)?;

    Ok((0..batch.num_rows())
        .map(|i| AggregatedSales {
            key: SalesKey {
                store_id: keys[0][i] as i64,
                year: keys[1][i] as i64,
                month: keys[2][i] as i64,
                day: keys[3][i] as i64,
                weekday: keys[4][i] as i64,
            },
            total_sales: totals[i],
        })
        .collect())
}

/// Numeric column as f64; nulls and unparsable values are schema errors
pub fn column_f64(batch: &RecordBatch, name: &str) -> Result<Vec<f64>> {
    let index = batch
        .schema()
        .index_of(name)
        .map_err(|_| PipelineError::missing_column(name))?;
    let column = batch.column(index);
    if column.null_count() > 0 {
        return Err(PipelineError::Schema(format!("column `{}` contains nulls", name)));
    }

    let values = cast(column, &DataType::Float64).map_err(|e| {
        PipelineError::Schema(format!("column `{}` is not numeric: {}", name, e))
    })?;
    // Safe casts turn unparsable strings into nulls
    if values.null_count() > 0 {
        return Err(PipelineError::Schema(format!("column `{}` is not numeric", name)));
    }

    Ok(values.as_primitive::<Float64Type>().values().to_vec())
}

pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    write_atomically(path, |file| {
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
        writer.write(batch)?;
        writer.close()?;
        Ok(())
    })
}

pub fn read_parquet(path: &Path) -> Result<RecordBatch> {
    let file = open_input(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let batches = builder
        .build()?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

/// CSV with a header row; column types are inferred from the data
pub fn read_csv_table(path: &Path) -> Result<RecordBatch> {
    let mut file = open_input(path)?;
    let (schema, _) = arrow::csv::reader::Format::default()
        .with_header(true)
        .infer_schema(&mut file, None)?;
    file.rewind()?;

    let schema = Arc::new(schema);
    let batches = arrow::csv::ReaderBuilder::new(schema.clone())
        .with_header(true)
        .build(file)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

/// Read a whole table, choosing the format from the file extension
pub fn read_table(path: &Path) -> Result<RecordBatch> {
    if is_parquet(path) {
        read_parquet(path)
    } else {
        read_csv_table(path)
    }
}
