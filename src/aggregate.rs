//! Raw transactions to per-store daily totals
//!
//! Each transaction's date is split into year / month / day / weekday,
//! client and product ids are dropped, and prices are summed per
//! (store_id, year, month, day, weekday). Output rows are sorted by that key.

use crate::config::Paths;
use crate::error::Result;
use crate::models::{AggregatedSales, SalesKey, Transaction};
use crate::naming;
use crate::table;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

/// Sum values per key, summing within a key in input order
pub fn sum_by_key<I>(rows: I) -> Vec<AggregatedSales>
where
    I: IntoIterator<Item = (SalesKey, f64)>,
{
    let mut totals: BTreeMap<SalesKey, f64> = BTreeMap::new();
    for (key, value) in rows {
        *totals.entry(key).or_insert(0.0) += value;
    }
    totals
        .into_iter()
        .map(|(key, total_sales)| AggregatedSales { key, total_sales })
        .collect()
}

pub fn raw_to_weekday(raw: &[Transaction]) -> Vec<AggregatedSales> {
    sum_by_key(raw.iter().map(|tx| (tx.key(), tx.price)))
}

/// Group an already aggregated table again by the same key
pub fn regroup(rows: &[AggregatedSales]) -> Vec<AggregatedSales> {
    sum_by_key(rows.iter().map(|r| (r.key, r.total_sales)))
}

/// Aggregate `<data_dir>/<file_name>` into a Parquet file beside it
pub fn run(paths: &Paths, file_name: &str) -> Result<PathBuf> {
    let input = paths.data_file(file_name);
    let output = paths.data_file(naming::aggregated_name(file_name));

    info!(input = %input.display(), "Reading raw transactions");
    let raw = table::read_transactions(&input)?;
    let aggregated = raw_to_weekday(&raw);
    info!(raw_rows = raw.len(), groups = aggregated.len(), "Aggregated sales");

    table::write_parquet(&output, &table::aggregated_to_batch(&aggregated)?)?;
    info!("Processed data saved to {}.", output.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::error::PipelineError;
    use crate::generator::{generate_data, GeneratedData, Mode, ProductCatalog};
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::fs;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn generated(
        config: &PipelineConfig,
        from: NaiveDate,
        to: NaiveDate,
        seed: u64,
    ) -> Vec<Transaction> {
        let mut rng = StdRng::seed_from_u64(seed);
        let catalog = ProductCatalog::generate(config, &mut rng);
        match generate_data(config, &catalog, from, to, Mode::Train, &mut rng).unwrap() {
            GeneratedData::Train(rows) => rows,
            GeneratedData::Predict(_) => unreachable!(),
        }
    }

    fn temp_paths(dir: &std::path::Path) -> Paths {
        Paths {
            data_dir: dir.join("data"),
            models_dir: dir.join("models"),
            log_dir: dir.join("logs"),
        }
    }

    #[test]
    fn test_groups_by_store_and_day() {
        let date = ymd(2023, 8, 1);
        let tx = |store_id, date, price| Transaction {
            store_id,
            date,
            client_id: 100_000,
            product_id: 1000,
            price,
        };
        let raw = vec![
            tx(5001, date, 10.0),
            tx(5000, date, 1.5),
            tx(5001, date, 5.0),
            tx(5000, ymd(2023, 8, 2), 2.0),
        ];

        let rows = raw_to_weekday(&raw);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], AggregatedSales { key: SalesKey::new(5000, date), total_sales: 1.5 });
        assert_eq!(rows[1].key, SalesKey::new(5000, ymd(2023, 8, 2)));
        assert_eq!(rows[2], AggregatedSales { key: SalesKey::new(5001, date), total_sales: 15.0 });
    }

    #[test]
    fn test_one_row_per_distinct_key_and_value_conserved() {
        let config = PipelineConfig::default();
        let raw = generated(&config, ymd(2023, 11, 27), ymd(2023, 12, 3), 17);
        let rows = raw_to_weekday(&raw);

        let distinct: HashSet<SalesKey> = raw.iter().map(Transaction::key).collect();
        assert_eq!(rows.len(), distinct.len());

        let raw_total: f64 = raw.iter().map(|t| t.price).sum();
        let agg_total: f64 = rows.iter().map(|r| r.total_sales).sum();
        assert!((raw_total - agg_total).abs() < 1e-6 * raw_total.abs().max(1.0));
    }

    #[test]
    fn test_regroup_is_identity() {
        let config = PipelineConfig::default();
        let raw = generated(&config, ymd(2024, 3, 1), ymd(2024, 3, 4), 23);
        let rows = raw_to_weekday(&raw);
        assert_eq!(regroup(&rows), rows);
    }

    #[test]
    fn test_empty_input() {
        assert!(raw_to_weekday(&[]).is_empty());
    }

    #[test]
    fn test_single_store_day_round_trip() {
        let config = PipelineConfig::default();
        let store = config.store(5000).unwrap().clone();
        let config = PipelineConfig { stores: vec![store], ..config };
        let day = ymd(2023, 8, 1);

        let dir = tempfile::tempdir().unwrap();
        let paths = temp_paths(dir.path());
        let raw = generated(&config, day, day, 31);
        table::write_transactions(&paths.data_file("train-2023-08-01.csv"), &raw).unwrap();

        let output = run(&paths, "train-2023-08-01.csv").unwrap();
        assert_eq!(output, paths.data_file("train-2023-08-01.parquet"));

        let rows = table::batch_to_aggregated(&table::read_table(&output).unwrap()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, SalesKey::new(5000, day));

        let expected: f64 = raw.iter().map(|t| t.price).sum();
        assert!((rows[0].total_sales - expected).abs() < 1e-6);
    }

    #[test]
    fn test_missing_price_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = temp_paths(dir.path());
        fs::create_dir_all(&paths.data_dir).unwrap();
        fs::write(
            paths.data_file("train-2023-08-01.csv"),
            "store_id,date,client_id,product_id\n5000,2023-08-01,100001,1500\n",
        )
        .unwrap();

        let err = run(&paths, "train-2023-08-01.csv").unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
        assert!(!paths.data_file("train-2023-08-01.parquet").exists());
    }
}
