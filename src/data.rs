use log::{debug, warn};
use parking_lot::Mutex;
use std::{collections::HashMap, io::Read, sync::Arc, time::Duration};
use thiserror::Error;

/// Source of the hospital discharge statistics.
pub const DATA_URL: &str =
    "https://raw.githubusercontent.com/drpawelo/python-advanced-HSC/main/week_05/starting_code/OCED_simplified.csv";

pub const COUNTRY_COLUMN: &str = "country";
pub const YEAR_COLUMN: &str = "year";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum DataError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("fetch failed with status {0}")]
    Status(u16),
    #[error("csv parse failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset is missing the {0:?} column")]
    MissingColumn(&'static str),
}

/// One observation: a country in a given year, with a value per numeric
/// column (missing cells are `None`).
pub struct RawRow {
    pub country: String,
    pub year: i32,
    pub values: Vec<Option<f64>>,
}

/// The fetched dataset. Immutable once parsed; shared as `Arc<RawDataset>`.
pub struct RawDataset {
    /// Numeric column names in header order.
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
    column_index: HashMap<String, usize>,
}

impl RawDataset {
    pub fn from_csv(reader: impl Read) -> Result<Self, DataError> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let country_pos = headers
            .iter()
            .position(|h| h == COUNTRY_COLUMN)
            .ok_or(DataError::MissingColumn(COUNTRY_COLUMN))?;
        let year_pos = headers
            .iter()
            .position(|h| h == YEAR_COLUMN)
            .ok_or(DataError::MissingColumn(YEAR_COLUMN))?;

        let mut columns = Vec::new();
        let mut value_positions = Vec::new();
        for (i, name) in headers.iter().enumerate() {
            if i != country_pos && i != year_pos {
                columns.push(name.to_string());
                value_positions.push(i);
            }
        }

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let country = record.get(country_pos).unwrap_or("").trim();
            if country.is_empty() {
                continue;
            }
            let Some(year) = record
                .get(year_pos)
                .and_then(|y| y.trim().parse::<i32>().ok())
            else {
                warn!("skipping row for {country:?} with unparseable year");
                continue;
            };
            let values = value_positions
                .iter()
                .map(|&pos| {
                    record
                        .get(pos)
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .and_then(|v| v.parse::<f64>().ok())
                        .filter(|v| v.is_finite())
                })
                .collect();
            rows.push(RawRow {
                country: country.to_string(),
                year,
                values,
            });
        }

        let column_index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        debug!(
            "parsed dataset: {} rows, {} numeric columns",
            rows.len(),
            columns.len()
        );
        Ok(Self {
            columns,
            rows,
            column_index,
        })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }
}

/// Fetches the CSV over HTTP and parses it. A non-2xx response is an error;
/// nothing is cached here.
pub fn fetch_csv(url: &str) -> Result<RawDataset, DataError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()?;
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(DataError::Status(status.as_u16()));
    }
    let body = response.text()?;
    RawDataset::from_csv(body.as_bytes())
}

/// Process-scoped store for the fetched dataset. Populated at most once on
/// success and kept until process exit; a failed fetch stores nothing, so
/// the next call retries.
///
/// Two overlapping first calls may both run their fetch and both store the
/// result (last writer wins). Acceptable for a single-user session; the
/// fetch runs outside the lock so a slow network never blocks readers.
pub struct DatasetCache {
    slot: Mutex<Option<Arc<RawDataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// The cached dataset, if any, without triggering a fetch.
    pub fn get(&self) -> Option<Arc<RawDataset>> {
        self.slot.lock().clone()
    }

    pub fn get_or_load_with<F>(&self, fetch: F) -> Result<Arc<RawDataset>, DataError>
    where
        F: FnOnce() -> Result<RawDataset, DataError>,
    {
        if let Some(cached) = self.get() {
            return Ok(cached);
        }
        let loaded = Arc::new(fetch()?);
        *self.slot.lock() = Some(loaded.clone());
        Ok(loaded)
    }

    /// Drops the cached dataset so the next load fetches again.
    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new()
    }
}
