//! Model training and the persisted model artifact
//!
//! The target column is split off and every other column becomes a numeric
//! feature, in table order. The fit is delegated to smartcore's random forest
//! regressor with a fixed seed, so identical data yields an identical model.

use crate::config::{ForestConfig, Paths};
use crate::error::{PipelineError, Result};
use crate::models::TARGET_COLUMN;
use crate::naming;
use crate::table;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Bumped whenever the artifact layout changes
pub const FORMAT_VERSION: u32 = 1;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Feature matrix and target vector pulled out of a table
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub features: Vec<String>,
    /// Column-major feature values
    pub columns: Vec<f64>,
    pub target: Vec<f64>,
}

impl TrainingSet {
    pub fn n_rows(&self) -> usize {
        self.target.len()
    }

    fn matrix(&self) -> DenseMatrix<f64> {
        DenseMatrix::new(self.n_rows(), self.features.len(), self.columns.clone(), true)
    }
}

/// Column-major matrix of the named columns
pub(crate) fn feature_matrix(batch: &RecordBatch, features: &[String]) -> Result<DenseMatrix<f64>> {
    let mut values = Vec::with_capacity(batch.num_rows() * features.len());
    for name in features {
        values.extend(table::column_f64(batch, name)?);
    }
    Ok(DenseMatrix::new(batch.num_rows(), features.len(), values, true))
}

pub fn split_features_and_target(batch: &RecordBatch, target: &str) -> Result<TrainingSet> {
    let y = table::column_f64(batch, target)?;
    if y.is_empty() {
        return Err(PipelineError::Schema("training table has no rows".to_string()));
    }

    let features: Vec<String> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .filter(|name| name != target)
        .collect();
    if features.is_empty() {
        return Err(PipelineError::Schema("training table has no feature columns".to_string()));
    }

    let mut columns = Vec::with_capacity(y.len() * features.len());
    for name in &features {
        columns.extend(table::column_f64(batch, name)?);
    }

    Ok(TrainingSet { features, columns, target: y })
}

/// Fitted regressor plus the column framing it was trained with
#[derive(Debug, Serialize, Deserialize)]
pub struct SalesModel {
    format_version: u32,
    target: String,
    features: Vec<String>,
    forest: Forest,
}

impl SalesModel {
    pub fn fit(set: &TrainingSet, target: &str, config: &ForestConfig) -> Result<Self> {
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(config.n_trees.into())
            .with_seed(config.seed);

        let forest = Forest::fit(&set.matrix(), &set.target, params)
            .map_err(|e| PipelineError::Estimator(e.to_string()))?;

        Ok(Self {
            format_version: FORMAT_VERSION,
            target: target.to_string(),
            features: set.features.clone(),
            forest,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Feature columns, in the order the model expects them
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// One estimate per row of `batch`, read from the model's feature columns
    pub fn predict(&self, batch: &RecordBatch) -> Result<Vec<f64>> {
        if batch.num_rows() == 0 {
            return Ok(Vec::new());
        }
        let x = feature_matrix(batch, &self.features)?;
        self.forest
            .predict(&x)
            .map_err(|e| PipelineError::Estimator(format!("inference failed: {}", e)))
    }
}

pub fn train_model(batch: &RecordBatch, target: &str, config: &ForestConfig) -> Result<SalesModel> {
    let set = split_features_and_target(batch, target)?;
    info!(rows = set.n_rows(), features = ?set.features, "Training model...");
    let model = SalesModel::fit(&set, target, config)?;
    info!("Model trained successfully!");
    Ok(model)
}

pub fn save_model(path: &Path, model: &SalesModel) -> Result<()> {
    info!("Saving model to {}", path.display());
    table::write_atomically(path, |file| {
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, model)
            .map_err(|e| PipelineError::Io(std::io::Error::other(e)))?;
        writer.flush()?;
        Ok(())
    })
}

pub fn load_model(path: &Path) -> Result<SalesModel> {
    let mut bytes = Vec::new();
    table::open_input(path)?.read_to_end(&mut bytes)?;

    let model: SalesModel =
        bincode::deserialize(&bytes).map_err(|e| PipelineError::ModelCorrupt(e.to_string()))?;
    if model.format_version != FORMAT_VERSION {
        return Err(PipelineError::ModelCorrupt(format!(
            "unsupported format version {} (expected {})",
            model.format_version, FORMAT_VERSION
        )));
    }
    if model.features.is_empty() {
        return Err(PipelineError::ModelCorrupt("model has no feature columns".to_string()));
    }
    Ok(model)
}

/// Train on `data_path` and write `<models_dir>/model-<name>.bin`
pub fn run(paths: &Paths, forest: &ForestConfig, data_path: &Path) -> Result<PathBuf> {
    let batch = table::read_table(data_path)?;
    let model = train_model(&batch, TARGET_COLUMN, forest)?;

    let output = paths.model_file(naming::model_name(data_path));
    save_model(&output, &model)?;
    Ok(output)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::aggregate::raw_to_weekday;
    use crate::config::PipelineConfig;
    use crate::generator::{generate_data, GeneratedData, Mode, ProductCatalog};
    use crate::models::SalesKey;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;

    /// Aggregated table for all default stores over January 2023
    pub(crate) fn aggregated_batch() -> RecordBatch {
        let config = PipelineConfig::default();
        let mut rng = StdRng::seed_from_u64(195);
        let catalog = ProductCatalog::generate(&config, &mut rng);
        let from = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();

        let GeneratedData::Train(raw) =
            generate_data(&config, &catalog, from, to, Mode::Train, &mut rng).unwrap()
        else {
            unreachable!()
        };
        table::aggregated_to_batch(&raw_to_weekday(&raw)).unwrap()
    }

    pub(crate) fn small_forest() -> ForestConfig {
        ForestConfig { n_trees: 20, seed: 195 }
    }

    fn registers(keys: &[SalesKey]) -> RecordBatch {
        table::registers_to_batch(keys).unwrap()
    }

    #[test]
    fn test_split_features_and_target() {
        let batch = aggregated_batch();
        let set = split_features_and_target(&batch, TARGET_COLUMN).unwrap();

        assert_eq!(set.features, ["store_id", "year", "month", "day", "weekday"]);
        assert_eq!(set.n_rows(), batch.num_rows());
        assert_eq!(set.columns.len(), set.n_rows() * 5);
    }

    #[test]
    fn test_missing_target() {
        let batch = registers(&[SalesKey::new(5000, NaiveDate::from_ymd_opt(2023, 8, 1).unwrap())]);
        let err = train_model(&batch, TARGET_COLUMN, &small_forest()).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(ref m) if m.contains("total_sales")));
    }

    #[test]
    fn test_model_separates_stores() {
        let model = train_model(&aggregated_batch(), TARGET_COLUMN, &small_forest()).unwrap();
        assert_eq!(model.target(), TARGET_COLUMN);

        let day = NaiveDate::from_ymd_opt(2023, 1, 17).unwrap();
        let predictions = model
            .predict(&registers(&[SalesKey::new(5003, day), SalesKey::new(5001, day)]))
            .unwrap();

        // Roughly 200 * 220 versus 10 * 500 per day
        assert_eq!(predictions.len(), 2);
        assert!(predictions[0] > 4.0 * predictions[1], "{:?}", predictions);
    }

    #[test]
    fn test_seeded_fit_is_deterministic() {
        let batch = aggregated_batch();
        let a = train_model(&batch, TARGET_COLUMN, &small_forest()).unwrap();
        let b = train_model(&batch, TARGET_COLUMN, &small_forest()).unwrap();

        let day = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
        let query = registers(&[SalesKey::new(5000, day), SalesKey::new(5004, day)]);
        assert_eq!(a.predict(&query).unwrap(), b.predict(&query).unwrap());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model-2023-01-31.bin");
        let model = train_model(&aggregated_batch(), TARGET_COLUMN, &small_forest()).unwrap();
        save_model(&path, &model).unwrap();

        let loaded = load_model(&path).unwrap();
        assert_eq!(loaded.features(), model.features());

        let day = NaiveDate::from_ymd_opt(2023, 1, 9).unwrap();
        let query = registers(&[SalesKey::new(5002, day)]);
        assert_eq!(loaded.predict(&query).unwrap(), model.predict(&query).unwrap());
    }

    #[test]
    fn test_corrupt_and_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model-bad.bin");
        fs::write(&path, b"not a model").unwrap();

        assert!(matches!(load_model(&path), Err(PipelineError::ModelCorrupt(_))));
        assert!(matches!(
            load_model(&dir.path().join("absent.bin")),
            Err(PipelineError::InputNotFound { .. })
        ));
    }

    #[test]
    fn test_run_names_model_after_data() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            data_dir: dir.path().join("data"),
            models_dir: dir.path().join("models"),
            log_dir: dir.path().join("logs"),
        };
        let data_path = paths.data_file("train-2023-01-31.parquet");
        table::write_parquet(&data_path, &aggregated_batch()).unwrap();

        let output = run(&paths, &small_forest(), &data_path).unwrap();
        assert_eq!(output, paths.model_file("model-2023-01-31.bin"));
        assert!(load_model(&output).is_ok());
    }

    #[test]
    fn test_failed_run_persists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            data_dir: dir.path().join("data"),
            models_dir: dir.path().join("models"),
            log_dir: dir.path().join("logs"),
        };
        let data_path = paths.data_file("train-x.parquet");
        let day = NaiveDate::from_ymd_opt(2023, 8, 1).unwrap();
        table::write_parquet(&data_path, &registers(&[SalesKey::new(5000, day)])).unwrap();

        assert!(run(&paths, &small_forest(), &data_path).is_err());
        assert!(!paths.model_file("model-x.bin").exists());
    }
}
