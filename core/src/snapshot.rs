//! Market-price snapshot loading.
//!
//! An upstream job drops one Parquet file per day and category into object
//! storage, keyed `{YYYYMMDD}_{basename}.parquet`. A run uses today's file
//! and falls back to yesterday's when today's has not arrived yet.

use crate::{
    clock::BusinessClock,
    error::{BonusError, BonusResult},
    model::PriceObservation,
};
use bytes::Bytes;
use chrono::NaiveDate;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Field, Row};
use parquet::schema::types::Type;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

/// Columns read from the snapshot; everything else is skipped.
pub const SNAPSHOT_COLUMNS: [&str; 6] =
    ["consumption", "zip", "city", "rank", "provider", "priceSumNet"];

/// Read access to the bucket holding the snapshots.
pub trait ObjectStore {
    fn exists(&self, key: &str) -> BonusResult<bool>;
    fn fetch(&self, key: &str) -> BonusResult<Vec<u8>>;
}

/// Object store backed by a local directory, one file per key.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ObjectStore for LocalObjectStore {
    fn exists(&self, key: &str) -> BonusResult<bool> {
        match std::fs::metadata(self.root.join(key)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BonusError::snapshot_access(key, e)),
        }
    }

    fn fetch(&self, key: &str) -> BonusResult<Vec<u8>> {
        std::fs::read(self.root.join(key)).map_err(|e| BonusError::snapshot_access(key, e))
    }
}

/// Object key of the snapshot for `date`. The basename is the price file
/// identifier without its extension (`Strom_Online.zip` -> `Strom_Online`).
pub fn snapshot_key(date: NaiveDate, marketdata_name: &str) -> String {
    let basename = marketdata_name
        .rsplit_once('.')
        .map_or(marketdata_name, |(stem, _)| stem);
    format!("{}_{basename}.parquet", date.format("%Y%m%d"))
}

/// A loaded snapshot and the key it came from.
#[derive(Debug, Clone)]
pub struct PriceSnapshot {
    pub key:          String,
    pub observations: Vec<PriceObservation>,
    /// Rows left out because zip, city, rank or priceSumNet was null.
    pub skipped:      usize,
}

pub struct SnapshotLoader<'a, S: ObjectStore> {
    store: &'a S,
    clock: &'a BusinessClock,
}

impl<'a, S: ObjectStore> SnapshotLoader<'a, S> {
    pub fn new(store: &'a S, clock: &'a BusinessClock) -> Self {
        Self { store, clock }
    }

    /// Key of the newest available snapshot, today before yesterday.
    pub fn locate(&self, marketdata_name: &str) -> BonusResult<String> {
        let keys = [
            snapshot_key(self.clock.today(), marketdata_name),
            snapshot_key(self.clock.yesterday(), marketdata_name),
        ];
        for key in &keys {
            if self.store.exists(key)? {
                return Ok(key.clone());
            }
        }
        Err(BonusError::SnapshotNotFound { keys: keys.to_vec() })
    }

    pub fn load(&self, marketdata_name: &str) -> BonusResult<PriceSnapshot> {
        let key = self.locate(marketdata_name)?;
        let raw = self.store.fetch(&key)?;
        let (observations, skipped) = decode_parquet(&key, Bytes::from(raw))?;
        Ok(PriceSnapshot { key, observations, skipped })
    }
}

/// Decode observations from Parquet, reading only SNAPSHOT_COLUMNS.
/// Returns the observations and the number of rows skipped for null cells.
///
/// A row without zip, city, rank or priceSumNet can never be matched and is
/// skipped. A null provider is a competitor. A null consumption fails the
/// load.
pub fn decode_parquet(key: &str, data: Bytes) -> BonusResult<(Vec<PriceObservation>, usize)> {
    let reader = SerializedFileReader::new(data).map_err(|e| BonusError::snapshot_access(key, e))?;

    let schema = reader.metadata().file_metadata().schema();
    let fields: Vec<Arc<Type>> = schema
        .get_fields()
        .iter()
        .filter(|f| SNAPSHOT_COLUMNS.iter().any(|col| *col == f.name()))
        .cloned()
        .collect();
    if let Some(missing) = SNAPSHOT_COLUMNS
        .iter()
        .find(|col| !fields.iter().any(|f| f.name() == **col))
    {
        return Err(BonusError::snapshot_access(key, format!("missing column {missing}")));
    }
    let projection = Type::group_type_builder(schema.name())
        .with_fields(fields)
        .build()
        .map_err(|e| BonusError::snapshot_access(key, e))?;

    let rows = reader
        .get_row_iter(Some(projection))
        .map_err(|e| BonusError::snapshot_access(key, e))?;

    let mut observations = Vec::new();
    let mut skipped = 0;
    for row in rows {
        let row = row.map_err(|e| BonusError::snapshot_access(key, e))?;
        match observation_from_row(&row).map_err(|e| BonusError::snapshot_access(key, e))? {
            Some(observation) => observations.push(observation),
            None => skipped += 1,
        }
    }
    Ok((observations, skipped))
}

fn observation_from_row(row: &Row) -> Result<Option<PriceObservation>, String> {
    let mut consumption = None;
    let mut zip = None;
    let mut city = None;
    let mut rank = None;
    let mut provider = None;
    let mut price_sum_net = None;

    for (name, field) in row.get_column_iter() {
        if matches!(field, Field::Null) {
            continue;
        }
        match name.as_str() {
            "consumption" => consumption = Some(as_int(name, field)?),
            "zip"         => zip = Some(as_text(name, field)?),
            "city"        => city = Some(as_text(name, field)?),
            "rank"        => rank = Some(as_int(name, field)?),
            "provider"    => provider = Some(as_text(name, field)?),
            "priceSumNet" => price_sum_net = Some(as_float(name, field)?),
            _ => {}
        }
    }

    let consumption = consumption.ok_or("row without consumption")?;
    let (Some(zip), Some(city), Some(rank), Some(price_sum_net)) = (zip, city, rank, price_sum_net)
    else {
        return Ok(None);
    };

    Ok(Some(PriceObservation {
        consumption,
        zip,
        city,
        rank,
        provider: provider.unwrap_or_default(),
        price_sum_net,
    }))
}

fn as_int(name: &str, field: &Field) -> Result<i64, String> {
    match field {
        Field::Byte(v)  => Ok(i64::from(*v)),
        Field::Short(v) => Ok(i64::from(*v)),
        Field::Int(v)   => Ok(i64::from(*v)),
        Field::Long(v)  => Ok(*v),
        Field::UInt(v)  => Ok(i64::from(*v)),
        // Integer columns with nulls arrive from pandas as doubles.
        Field::Double(v) if v.fract() == 0.0 => Ok(*v as i64),
        other => Err(format!("column {name}: expected integer, got {other}")),
    }
}

fn as_float(name: &str, field: &Field) -> Result<f64, String> {
    match field {
        Field::Float(v)  => Ok(f64::from(*v)),
        Field::Double(v) => Ok(*v),
        Field::Int(v)    => Ok(f64::from(*v)),
        Field::Long(v)   => Ok(*v as f64),
        other => Err(format!("column {name}: expected number, got {other}")),
    }
}

/// Zip codes are sometimes stored numerically; they are compared as text.
fn as_text(name: &str, field: &Field) -> Result<String, String> {
    match field {
        Field::Str(v)  => Ok(v.clone()),
        Field::Int(v)  => Ok(v.to_string()),
        Field::Long(v) => Ok(v.to_string()),
        other => Err(format!("column {name}: expected text, got {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Berlin;
    use std::collections::HashSet;

    struct FakeBucket {
        keys: HashSet<String>,
    }

    impl ObjectStore for FakeBucket {
        fn exists(&self, key: &str) -> BonusResult<bool> {
            Ok(self.keys.contains(key))
        }

        fn fetch(&self, key: &str) -> BonusResult<Vec<u8>> {
            Err(BonusError::snapshot_access(key, "not a real bucket"))
        }
    }

    fn clock() -> BusinessClock {
        BusinessClock::pinned(Berlin, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    #[test]
    fn key_strips_extension_and_prefixes_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(snapshot_key(date, "Strom_Online.zip"), "20240301_Strom_Online.parquet");
        assert_eq!(snapshot_key(date, "Gas"), "20240301_Gas.parquet");
    }

    #[test]
    fn today_is_preferred_over_yesterday() {
        let bucket = FakeBucket {
            keys: ["20240301_Strom.parquet", "20240229_Strom.parquet"]
                .into_iter()
                .map(String::from)
                .collect(),
        };
        let clock = clock();
        let loader = SnapshotLoader::new(&bucket, &clock);
        assert_eq!(loader.locate("Strom.zip").unwrap(), "20240301_Strom.parquet");
    }

    #[test]
    fn falls_back_to_yesterday_across_month_end() {
        let bucket = FakeBucket {
            keys: ["20240229_Gas.parquet".to_string()].into_iter().collect(),
        };
        let clock = clock();
        let loader = SnapshotLoader::new(&bucket, &clock);
        assert_eq!(loader.locate("Gas.zip").unwrap(), "20240229_Gas.parquet");
    }

    #[test]
    fn missing_snapshot_reports_probed_keys() {
        let bucket = FakeBucket { keys: HashSet::new() };
        let clock = clock();
        let loader = SnapshotLoader::new(&bucket, &clock);
        match loader.locate("Gas.zip") {
            Err(BonusError::SnapshotNotFound { keys }) => {
                assert_eq!(keys, vec!["20240301_Gas.parquet", "20240229_Gas.parquet"]);
            }
            other => panic!("expected SnapshotNotFound, got {other:?}"),
        }
    }

    #[test]
    fn fetch_failure_is_an_access_error() {
        let bucket = FakeBucket {
            keys: ["20240301_Gas.parquet".to_string()].into_iter().collect(),
        };
        let clock = clock();
        let loader = SnapshotLoader::new(&bucket, &clock);
        assert!(matches!(
            loader.load("Gas.zip"),
            Err(BonusError::SnapshotAccess { .. })
        ));
    }
}
