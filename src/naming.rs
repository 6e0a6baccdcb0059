//! File names passed between stages

use crate::generator::Mode;
use chrono::NaiveDate;
use std::path::Path;

pub const TRAIN_PREFIX: &str = "train-";
pub const MODEL_PREFIX: &str = "model-";
pub const PREDICT_PREFIX: &str = "predict-";
pub const PREDICT_DONE_PREFIX: &str = "predict-done-";
pub const MODEL_EXTENSION: &str = "bin";
pub const COLUMNAR_EXTENSION: &str = "parquet";

/// `train-YYYY-MM-DD.csv` or `predict-YYYY-MM-DD.parquet`
pub fn generated_name(mode: Mode, end: NaiveDate) -> String {
    let ext = match mode {
        Mode::Train => "csv",
        Mode::Predict => COLUMNAR_EXTENSION,
    };
    format!("{}-{}.{}", mode, end.format("%Y-%m-%d"), ext)
}

fn with_columnar_extension(name: &str) -> String {
    Path::new(name)
        .with_extension(COLUMNAR_EXTENSION)
        .to_string_lossy()
        .into_owned()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Aggregated output keeps the raw file's name with a Parquet extension
pub fn aggregated_name(raw_name: &str) -> String {
    match raw_name.strip_suffix(".csv") {
        Some(stem) => format!("{}.{}", stem, COLUMNAR_EXTENSION),
        None => format!("{}.{}", raw_name, COLUMNAR_EXTENSION),
    }
}

/// `data/train-2023-08-01.parquet` -> `model-2023-08-01.bin`
pub fn model_name(data_path: &Path) -> String {
    let stem = data_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = stem.strip_prefix(TRAIN_PREFIX).unwrap_or(&stem);
    format!("{}{}.{}", MODEL_PREFIX, stem, MODEL_EXTENSION)
}

/// `data/predict-2023-08-07.parquet` -> `predict-done-2023-08-07.parquet`
pub fn prediction_name(data_path: &Path) -> String {
    let name = with_columnar_extension(&file_name(data_path));
    if name.starts_with(PREDICT_DONE_PREFIX) {
        return name;
    }
    match name.strip_prefix(PREDICT_PREFIX) {
        Some(rest) => format!("{}{}", PREDICT_DONE_PREFIX, rest),
        None => format!("{}{}", PREDICT_DONE_PREFIX, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_names() {
        let end = NaiveDate::from_ymd_opt(2023, 8, 1).unwrap();
        assert_eq!(generated_name(Mode::Train, end), "train-2023-08-01.csv");
        assert_eq!(generated_name(Mode::Predict, end), "predict-2023-08-01.parquet");
    }

    #[test]
    fn test_aggregated_name() {
        assert_eq!(aggregated_name("train-2023-08-01.csv"), "train-2023-08-01.parquet");
        assert_eq!(aggregated_name("raw"), "raw.parquet");
    }

    #[test]
    fn test_model_name() {
        assert_eq!(model_name(Path::new("data/train-2023-08-01.parquet")), "model-2023-08-01.bin");
        assert_eq!(model_name(Path::new("train-2023-08-01.csv")), "model-2023-08-01.bin");
        assert_eq!(model_name(Path::new("/tmp/history.csv")), "model-history.bin");
    }

    #[test]
    fn test_prediction_name() {
        assert_eq!(
            prediction_name(Path::new("data/predict-2023-08-07.parquet")),
            "predict-done-2023-08-07.parquet"
        );
        assert_eq!(prediction_name(Path::new("requests.csv")), "predict-done-requests.parquet");
        assert_eq!(
            prediction_name(Path::new("predict-done-x.parquet")),
            "predict-done-x.parquet"
        );
    }
}
