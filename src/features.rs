//! Turns the raw (country, year) table into the numeric matrix the
//! embedding consumes: category-based column selection, forward-fill over
//! years, latest-year snapshot, coverage denylist, median imputation and
//! optional standardization.

use crate::categories;
use crate::data::RawDataset;
use log::debug;
use nalgebra::DMatrix;
use std::collections::HashMap;
use thiserror::Error;

/// Reference period: the most recent year with usable coverage.
pub const SNAPSHOT_YEAR: i32 = 2021;

/// Countries with too many missing metrics to survive imputation sensibly.
/// Derived from exploration of the source data; fixed, not computed.
pub const EXCLUDED_COUNTRIES: &[&str] = &[
    "United Kingdom",
    "China (People's Republic of)",
    "Estonia",
    "India",
    "Indonesia",
    "Russia",
    "South Africa",
    "Brazil",
    "Colombia",
];

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("column {0:?} not present in dataset")]
    UnknownColumn(String),
}

/// Row-aligned output of the pipeline: `matrix` row `i` describes
/// `countries[i]`. This alignment is the invariant everything downstream
/// (positions, colors, highlights) depends on.
pub struct FeatureTable {
    pub countries: Vec<String>,
    pub columns: Vec<String>,
    pub matrix: DMatrix<f64>,
}

pub fn build_features(
    data: &RawDataset,
    selected_categories: &[&str],
    include_aggregates: bool,
    scale: bool,
) -> Result<FeatureTable, FeatureError> {
    debug_assert!(
        !selected_categories.is_empty(),
        "empty selection is a UI state, not a feature-builder input"
    );

    let wanted = categories::columns_for(
        selected_categories.iter().copied(),
        include_aggregates,
    );
    let col_indices = wanted
        .iter()
        .map(|&name| {
            data.column_index(name)
                .ok_or_else(|| FeatureError::UnknownColumn(name.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Group row indices per country, keeping first-appearance order so the
    // output is stable across calls.
    let mut country_order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, row) in data.rows.iter().enumerate() {
        groups
            .entry(row.country.as_str())
            .or_insert_with(|| {
                country_order.push(row.country.as_str());
                Vec::new()
            })
            .push(i);
    }

    // Forward-fill per country over ascending years, snapshotting the carry
    // at the reference year.
    let mut countries: Vec<String> = Vec::new();
    let mut snapshots: Vec<Vec<Option<f64>>> = Vec::new();
    for country in country_order {
        if EXCLUDED_COUNTRIES.contains(&country) {
            continue;
        }
        let mut indices = groups.remove(country).unwrap_or_default();
        indices.sort_by_key(|&i| data.rows[i].year);

        let mut carry: Vec<Option<f64>> = vec![None; col_indices.len()];
        let mut snapshot: Option<Vec<Option<f64>>> = None;
        for i in indices {
            let row = &data.rows[i];
            if row.year > SNAPSHOT_YEAR {
                break;
            }
            for (slot, &col) in carry.iter_mut().zip(&col_indices) {
                if let Some(v) = row.values[col] {
                    *slot = Some(v);
                }
            }
            if row.year == SNAPSHOT_YEAR {
                snapshot = Some(carry.clone());
            }
        }
        if let Some(snapshot) = snapshot {
            countries.push(country.to_string());
            snapshots.push(snapshot);
        }
    }

    // Median imputation over the surviving rows only; the active subset
    // changes with every selection, so nothing here is cached.
    let n_rows = snapshots.len();
    let n_cols = col_indices.len();
    let mut matrix = DMatrix::zeros(n_rows, n_cols);
    for j in 0..n_cols {
        let mut observed: Vec<f64> =
            snapshots.iter().filter_map(|row| row[j]).collect();
        let fill = if observed.is_empty() {
            debug!("column {:?} has no observed values, imputing 0", wanted[j]);
            0.0
        } else {
            median(&mut observed)
        };
        for (i, row) in snapshots.iter().enumerate() {
            matrix[(i, j)] = row[j].unwrap_or(fill);
        }
    }

    if scale {
        standardize(&mut matrix);
    }

    Ok(FeatureTable {
        countries,
        columns: wanted.iter().map(|&c| c.to_string()).collect(),
        matrix,
    })
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        0.5 * (values[mid - 1] + values[mid])
    } else {
        values[mid]
    }
}

/// Per-column zero mean / unit variance (population variance), computed
/// from the current row set. Zero-variance columns are centred only.
fn standardize(matrix: &mut DMatrix<f64>) {
    let n = matrix.nrows();
    if n == 0 {
        return;
    }
    for j in 0..matrix.ncols() {
        let mut col = matrix.column_mut(j);
        let mean = col.iter().sum::<f64>() / n as f64;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        let std = var.sqrt();
        for v in col.iter_mut() {
            *v -= mean;
            if std > 0.0 {
                *v /= std;
            }
        }
    }
}
