//! Apply a trained model to prediction registers

use crate::config::Paths;
use crate::error::Result;
use crate::models::PREDICTION_COLUMN;
use crate::naming;
use crate::table;
use crate::training::{load_model, SalesModel};
use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// The input table with a `prediction_total_sales` column appended.
/// Row order and the original columns are left untouched.
pub fn predict(model: &SalesModel, data: &RecordBatch) -> Result<RecordBatch> {
    let predictions = model.predict(data)?;

    let mut fields: Vec<Field> = data
        .schema()
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    fields.push(Field::new(PREDICTION_COLUMN, DataType::Float64, false));

    let mut columns: Vec<ArrayRef> = data.columns().to_vec();
    columns.push(Arc::new(Float64Array::from(predictions)));

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Predict every register in `data_path` and write `<data_dir>/predict-done-<name>.parquet`
pub fn run(paths: &Paths, model_path: &Path, data_path: &Path) -> Result<PathBuf> {
    let data = table::read_table(data_path)?;
    let model = load_model(model_path)?;
    info!(rows = data.num_rows(), model = %model_path.display(), "Predicting total sales");

    let output = paths.data_file(naming::prediction_name(data_path));
    table::write_parquet(&output, &predict(&model, &data)?)?;
    info!("Predictions saved to {}.", output.display());
    Ok(output)
}
