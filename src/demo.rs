//! Synthetic stand-in dataset for running the dashboard without network
//! access. Countries are grouped into a few discharge profiles with
//! per-country jitter, so the embedding produces visible clusters, and a
//! fraction of pre-snapshot cells is knocked out to exercise the
//! forward-fill and imputation paths.

use crate::categories;
use crate::data::{RawDataset, RawRow};
use crate::features::SNAPSHOT_YEAR;
use rand::{rngs::StdRng, Rng, SeedableRng};

pub const DEMO_SEED: u64 = 42;

const DEMO_COUNTRIES: &[&str] = &[
    "Australia", "Austria", "Belgium", "Canada", "Chile", "Costa Rica", "Denmark", "Finland",
    "France", "Germany", "Greece", "Hungary", "Iceland", "Ireland", "Israel", "Italy", "Japan",
    "Korea", "Latvia", "Lithuania", "Luxembourg", "Mexico", "Netherlands", "New Zealand",
    "Norway", "Poland", "Portugal", "Slovenia", "Spain", "Sweden",
];

const PROFILE_COUNT: usize = 3;
const YEARS: std::ops::RangeInclusive<i32> = 2017..=SNAPSHOT_YEAR;
const MISSING_RATE: f64 = 0.05;

pub fn synthetic_dataset(seed: u64) -> RawDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let columns: Vec<String> = categories::all_columns_with_aggregates()
        .iter()
        .map(|c| c.to_string())
        .collect();

    // Per-profile, per-column base rates; countries in the same profile end
    // up near each other in feature space.
    let base_rates: Vec<Vec<f64>> = (0..PROFILE_COUNT)
        .map(|_| {
            columns
                .iter()
                .map(|_| rng.gen_range(50.0..2000.0))
                .collect()
        })
        .collect();

    let mut rows = Vec::new();
    for (i, country) in DEMO_COUNTRIES.iter().enumerate() {
        let base = &base_rates[i % PROFILE_COUNT];
        let country_jitter: Vec<f64> = columns
            .iter()
            .map(|_| rng.gen_range(0.9..1.1))
            .collect();
        for year in YEARS {
            let drift = 1.0 + 0.01 * (year - 2017) as f64;
            let values = base
                .iter()
                .zip(&country_jitter)
                .map(|(rate, jitter)| {
                    // Missing cells only before the snapshot year, so every
                    // country still yields a complete snapshot after the
                    // forward fill.
                    if year < SNAPSHOT_YEAR && rng.gen_bool(MISSING_RATE) {
                        None
                    } else {
                        Some(rate * jitter * drift * rng.gen_range(0.97..1.03))
                    }
                })
                .collect();
            rows.push(RawRow {
                country: country.to_string(),
                year,
                values,
            });
        }
    }

    raw_dataset(columns, rows)
}

fn raw_dataset(columns: Vec<String>, rows: Vec<RawRow>) -> RawDataset {
    // Serialize through the CSV parser so the demo takes the same path as
    // fetched data.
    let mut csv = String::from("country,year");
    for c in &columns {
        csv.push_str(",\"");
        csv.push_str(&c.replace('"', "\"\""));
        csv.push('"');
    }
    csv.push('\n');
    for row in &rows {
        csv.push_str(&row.country);
        csv.push(',');
        csv.push_str(&row.year.to_string());
        for v in &row.values {
            csv.push(',');
            if let Some(v) = v {
                csv.push_str(&format!("{v:.3}"));
            }
        }
        csv.push('\n');
    }
    RawDataset::from_csv(csv.as_bytes()).expect("synthetic csv is well formed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::build_features;

    #[test]
    fn demo_dataset_feeds_the_full_pipeline() {
        let data = synthetic_dataset(DEMO_SEED);
        assert_eq!(
            data.columns.len(),
            categories::all_columns_with_aggregates().len()
        );

        let selected: Vec<&str> = categories::CATEGORIES.iter().map(|c| c.name).collect();
        let ft = build_features(&data, &selected, false, true).unwrap();
        assert_eq!(ft.countries.len(), DEMO_COUNTRIES.len());
        assert!(ft.matrix.iter().all(|v| v.is_finite()));

        let proj = crate::projection::project(&ft.matrix, 3).unwrap();
        assert_eq!(proj.positions.len(), DEMO_COUNTRIES.len());
    }

    #[test]
    fn same_seed_means_same_dataset() {
        let a = synthetic_dataset(DEMO_SEED);
        let b = synthetic_dataset(DEMO_SEED);
        assert_eq!(a.rows.len(), b.rows.len());
        for (ra, rb) in a.rows.iter().zip(&b.rows) {
            assert_eq!(ra.country, rb.country);
            assert_eq!(ra.year, rb.year);
            assert_eq!(ra.values, rb.values);
        }
    }
}
