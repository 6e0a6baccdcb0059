//! Synthetic retail data generator
//!
//! Produces either raw transactions ("train" mode) or one prediction register
//! per store and day ("predict" mode) for an inclusive date range.
//!
//! Daily sale counts are Poisson around the store's mean, lifted on the
//! store's boost weekdays and boost months. The weekday lift is applied
//! first and the count is truncated after each lift.

use crate::config::{Paths, PipelineConfig, StoreProfile};
use crate::error::{PipelineError, Result};
use crate::models::{PredictRegister, SalesKey, Transaction};
use crate::{naming, table};
use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use rand::prelude::*;
use rand_distr::{Distribution, Normal, Poisson};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// What the generator emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Train,
    Predict,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Train => write!(f, "train"),
            Mode::Predict => write!(f, "predict"),
        }
    }
}

/// Fixed set of product ids shared by every transaction of one run
#[derive(Debug, Clone, PartialEq)]
pub struct ProductCatalog {
    ids: Vec<u32>,
}

impl ProductCatalog {
    /// Draw the catalog once; ids may repeat, as in a plain uniform draw
    pub fn generate(config: &PipelineConfig, rng: &mut impl Rng) -> Self {
        let ids = (0..config.catalog_size)
            .map(|_| rng.gen_range(config.product_id_range.clone()))
            .collect();
        Self { ids }
    }

    pub fn from_ids(ids: Vec<u32>) -> Result<Self> {
        if ids.is_empty() {
            return Err(PipelineError::Usage("product catalog is empty".to_string()));
        }
        Ok(Self { ids })
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Uniform pick with replacement
    pub fn sample(&self, rng: &mut impl Rng) -> u32 {
        // Catalog is never empty, see constructors
        self.ids.choose(rng).copied().unwrap_or_default()
    }
}

/// Calendar date from command-line parts
pub fn parse_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| PipelineError::Usage(format!("invalid date {}-{}-{}", year, month, day)))
}

/// Every date from `from` to `to`, both ends included
pub fn date_range(from: NaiveDate, to: NaiveDate) -> Result<Vec<NaiveDate>> {
    if from > to {
        return Err(PipelineError::Usage(format!(
            "start date {} is after end date {}",
            from, to
        )));
    }
    Ok(from.iter_days().take_while(|d| *d <= to).collect())
}

/// Number of sales for one store on one day, boosts included
pub fn sale_count(
    store: &StoreProfile,
    date: NaiveDate,
    config: &PipelineConfig,
    rng: &mut impl Rng,
) -> Result<usize> {
    let mut n = if store.avg_n > 0.0 {
        let poisson = Poisson::new(store.avg_n).map_err(|e| {
            PipelineError::Usage(format!("store {}: invalid avg_n: {}", store.store_id, e))
        })?;
        poisson.sample(rng) as usize
    } else {
        0
    };

    if store.is_boost_weekday(date.weekday()) {
        n = (n as f64 * rng.gen_range(config.weekday_boost.clone())) as usize;
    }

    if store.is_boost_month(date.month()) {
        n = (n as f64 * rng.gen_range(config.month_boost.clone())) as usize;
    }

    Ok(n)
}

/// Simulated transactions for one store on one day
pub fn generate_day_sales(
    store: &StoreProfile,
    date: NaiveDate,
    config: &PipelineConfig,
    catalog: &ProductCatalog,
    rng: &mut impl Rng,
) -> Result<Vec<Transaction>> {
    let n = sale_count(store, date, config, rng)?;
    let price = Normal::new(store.avg_price, store.std).map_err(|e| {
        PipelineError::Usage(format!("store {}: invalid price distribution: {}", store.store_id, e))
    })?;

    let sales = (0..n)
        .map(|_| Transaction {
            store_id: store.store_id,
            date,
            client_id: rng.gen_range(config.client_id_range.clone()),
            product_id: catalog.sample(rng),
            price: price.sample(rng),
        })
        .collect();

    Ok(sales)
}

pub fn generate_predict_register(store: &StoreProfile, date: NaiveDate) -> PredictRegister {
    SalesKey::new(store.store_id, date)
}

/// Output of one generator run
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedData {
    Train(Vec<Transaction>),
    Predict(Vec<PredictRegister>),
}

impl GeneratedData {
    pub fn len(&self) -> usize {
        match self {
            GeneratedData::Train(rows) => rows.len(),
            GeneratedData::Predict(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Generate data for every configured store and every date in range.
/// Rows come out store by store, dates ascending within a store.
pub fn generate_data(
    config: &PipelineConfig,
    catalog: &ProductCatalog,
    from: NaiveDate,
    to: NaiveDate,
    mode: Mode,
    rng: &mut impl Rng,
) -> Result<GeneratedData> {
    let dates = date_range(from, to)?;

    let data = match mode {
        Mode::Train => {
            let mut rows = Vec::new();
            for store in &config.stores {
                for &date in &dates {
                    let day = generate_day_sales(store, date, config, catalog, rng)?;
                    debug!(store_id = store.store_id, %date, sales = day.len(), "generated day");
                    rows.extend(day);
                }
            }
            GeneratedData::Train(rows)
        }
        Mode::Predict => GeneratedData::Predict(
            config
                .stores
                .iter()
                .flat_map(|store| dates.iter().map(move |&d| generate_predict_register(store, d)))
                .collect(),
        ),
    };

    Ok(data)
}

/// Generate one run and write it to `<data_dir>/<mode>-<to>.{csv,parquet}`.
/// Nothing is written when the dates are invalid or out of order.
pub fn run(
    config: &PipelineConfig,
    paths: &Paths,
    from: NaiveDate,
    to: NaiveDate,
    mode: Mode,
    seed: Option<u64>,
) -> Result<PathBuf> {
    config.validate()?;

    let mut rng: StdRng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let catalog = ProductCatalog::generate(config, &mut rng);

    let data = generate_data(config, &catalog, from, to, mode, &mut rng)?;
    let path = paths.data_file(naming::generated_name(mode, to));

    info!("Saving {} data to {}...", mode, path.display());
    match &data {
        GeneratedData::Train(rows) => table::write_transactions(&path, rows)?,
        GeneratedData::Predict(rows) => {
            table::write_parquet(&path, &table::registers_to_batch(rows)?)?
        }
    }
    info!(rows = data.len(), "Data saved successfully.");

    Ok(path)
}
