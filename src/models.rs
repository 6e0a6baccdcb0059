use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Date format used in raw transaction CSVs
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Columns every raw transaction CSV must carry
pub const TRANSACTION_COLUMNS: [&str; 5] = ["store_id", "date", "client_id", "product_id", "price"];

/// Grouping and feature columns, in table order
pub const KEY_COLUMNS: [&str; 5] = ["store_id", "year", "month", "day", "weekday"];

pub const TARGET_COLUMN: &str = "total_sales";
pub const PREDICTION_COLUMN: &str = "prediction_total_sales";

/// One simulated sale, as stored in the raw CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub store_id: u32,
    #[serde(with = "date_format")]
    pub date: NaiveDate,
    pub client_id: u32,
    pub product_id: u32,
    pub price: f64,
}

/// Feature row for a (store, date) whose sales are unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SalesKey {
    pub store_id: i64,
    pub year: i64,
    pub month: i64,
    pub day: i64,
    /// 0 = Monday, 6 = Sunday
    pub weekday: i64,
}

impl SalesKey {
    pub fn new(store_id: u32, date: NaiveDate) -> Self {
        Self {
            store_id: store_id as i64,
            year: date.year() as i64,
            month: date.month() as i64,
            day: date.day() as i64,
            weekday: date.weekday().num_days_from_monday() as i64,
        }
    }
}

/// Prediction requests carry only the key fields
pub type PredictRegister = SalesKey;

/// Total sales for one store on one day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedSales {
    pub key: SalesKey,
    pub total_sales: f64,
}

impl Transaction {
    pub fn key(&self) -> SalesKey {
        SalesKey::new(self.store_id, self.date)
    }
}

mod date_format {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}
