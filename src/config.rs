//! Pipeline configuration
//! Store profiles, sampling constants and on-disk layout, built once at startup
//! and handed to each stage by reference.

use crate::error::{PipelineError, Result};
use chrono::Weekday;
use std::collections::HashSet;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Demand profile for one store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreProfile {
    pub store_id: u32,
    /// Mean daily transaction count (Poisson lambda)
    pub avg_n: f64,
    pub avg_price: f64,
    pub std: f64,
    /// 0 = Monday .. 6 = Sunday, the same numbering as the `weekday` column.
    /// Values outside that range never match.
    pub boost_weekdays: Vec<u32>,
    /// Calendar months, 1 = January
    pub boost_months: Vec<u32>,
}

impl StoreProfile {
    fn new(
        store_id: u32,
        avg_n: f64,
        avg_price: f64,
        std: f64,
        boost_weekdays: &[u32],
        boost_months: &[u32],
    ) -> Self {
        Self {
            store_id,
            avg_n,
            avg_price,
            std,
            boost_weekdays: boost_weekdays.to_vec(),
            boost_months: boost_months.to_vec(),
        }
    }

    pub fn is_boost_weekday(&self, weekday: Weekday) -> bool {
        self.boost_weekdays.contains(&weekday.num_days_from_monday())
    }

    pub fn is_boost_month(&self, month: u32) -> bool {
        self.boost_months.contains(&month)
    }
}

/// Random forest settings used by the trainer
#[derive(Debug, Clone, PartialEq)]
pub struct ForestConfig {
    pub n_trees: u16,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self { n_trees: 100, seed: 195 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub stores: Vec<StoreProfile>,
    pub catalog_size: usize,
    pub product_id_range: Range<u32>,
    pub client_id_range: Range<u32>,
    pub weekday_boost: Range<f64>,
    pub month_boost: Range<f64>,
    pub forest: ForestConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let stores = vec![
            StoreProfile::new(5000, 100.0, 350.0, 10.0, &[6, 7], &[5, 12]),
            StoreProfile::new(5001, 10.0, 500.0, 20.0, &[7], &[5, 12]),
            StoreProfile::new(5002, 25.0, 400.0, 10.0, &[7], &[4, 10, 12]),
            StoreProfile::new(5003, 200.0, 220.0, 12.0, &[1, 3, 7], &[]),
            StoreProfile::new(5004, 140.0, 415.0, 17.0, &[4, 6, 7], &[4, 10, 12]),
            StoreProfile::new(5005, 50.0, 890.0, 15.0, &[6, 7], &[5, 12]),
        ];

        Self {
            stores,
            catalog_size: 30,
            product_id_range: 1000..3000,
            client_id_range: 100_000..400_000,
            weekday_boost: 1.6..1.7,
            month_boost: 1.45..1.50,
            forest: ForestConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn store(&self, store_id: u32) -> Option<&StoreProfile> {
        self.stores.iter().find(|s| s.store_id == store_id)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for store in &self.stores {
            if !seen.insert(store.store_id) {
                return Err(PipelineError::Usage(format!(
                    "duplicate store id {}",
                    store.store_id
                )));
            }
            if !(store.avg_n >= 0.0) || !(store.std >= 0.0) {
                return Err(PipelineError::Usage(format!(
                    "store {} has a negative avg_n or std",
                    store.store_id
                )));
            }
        }

        if self.catalog_size == 0 || self.product_id_range.is_empty() {
            return Err(PipelineError::Usage("product catalog is empty".to_string()));
        }
        if self.client_id_range.is_empty()
            || self.weekday_boost.is_empty()
            || self.month_boost.is_empty()
        {
            return Err(PipelineError::Usage("empty sampling range".to_string()));
        }

        Ok(())
    }
}

/// Directory layout shared by all stages
#[derive(Debug, Clone, PartialEq)]
pub struct Paths {
    pub data_dir: PathBuf,
    pub models_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            models_dir: PathBuf::from("models"),
            log_dir: PathBuf::from("data/logs"),
        }
    }
}

impl Paths {
    pub fn data_file(&self, name: impl AsRef<Path>) -> PathBuf {
        self.data_dir.join(name)
    }

    pub fn model_file(&self, name: impl AsRef<Path>) -> PathBuf {
        self.models_dir.join(name)
    }
}
