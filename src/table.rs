//! Detail-table view model: the processed dataset transposed so diagnosis
//! columns become rows and countries become columns. Built once per dataset
//! (the numbers never change, only what is shown) and filtered per frame by
//! category selection, country selection and the collapsed-row state.

use crate::categories;
use crate::data::RawDataset;
use crate::features::{build_features, FeatureError};
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowKind {
    /// Chapter-total row; clicking it collapses the chapter's sub-rows.
    Summary,
    Normal,
}

pub struct TableRow {
    /// Raw dataset column name; key for visibility filtering.
    pub name: String,
    /// Name with underscores unfolded for display.
    pub display_name: String,
    pub kind: RowKind,
    /// One value per country, aligned with [`TableView::countries`].
    pub values: Vec<f64>,
}

pub struct TableView {
    pub countries: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl TableView {
    /// Runs the unscaled, aggregate-inclusive pipeline over every category
    /// and transposes the result. Call once per dataset and cache.
    pub fn build(data: &RawDataset) -> Result<Self, FeatureError> {
        let all: Vec<&str> = categories::CATEGORIES.iter().map(|c| c.name).collect();
        let ft = build_features(data, &all, true, false)?;

        let summary: HashSet<&str> = categories::summary_columns().into_iter().collect();
        let rows = ft
            .columns
            .iter()
            .enumerate()
            .map(|(j, name)| TableRow {
                name: name.clone(),
                display_name: name.replace('_', " "),
                kind: if summary.contains(name.as_str()) {
                    RowKind::Summary
                } else {
                    RowKind::Normal
                },
                values: (0..ft.matrix.nrows()).map(|i| ft.matrix[(i, j)]).collect(),
            })
            .collect();

        Ok(Self {
            countries: ft.countries,
            rows,
        })
    }

    /// Row indices to show for the current category selection, minus rows
    /// whose collapsed flag is set. The collapsed vector is opaque UI
    /// state owned by the caller; indices past its end count as expanded.
    pub fn visible_rows(
        &self,
        selected_categories: &[&str],
        collapsed: &[bool],
    ) -> Vec<usize> {
        let wanted: HashSet<&str> =
            categories::columns_for(selected_categories.iter().copied(), true)
                .into_iter()
                .collect();
        self.rows
            .iter()
            .enumerate()
            .filter(|(i, row)| {
                wanted.contains(row.name.as_str()) && !collapsed.get(*i).copied().unwrap_or(false)
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// The normal rows belonging to the same chapter as the given summary
    /// row; these are what a click on the summary row collapses.
    pub fn chapter_rows(&self, summary_row: usize) -> Vec<usize> {
        let Some(row) = self.rows.get(summary_row) else {
            return Vec::new();
        };
        let Some(cat) = categories::category_of_column(&row.name) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                r.kind == RowKind::Normal && cat.columns.contains(&r.name.as_str())
            })
            .map(|(i, _)| i)
            .collect()
    }

    pub fn country_index(&self, country: &str) -> Option<usize> {
        self.countries.iter().position(|c| c == country)
    }
}

/// One decimal, comma-separated thousands: `12345.67` -> `"12,345.7"`.
pub fn format_value(v: f64) -> String {
    let rounded = format!("{:.1}", v.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), "0"));
    let mut grouped = String::new();
    let digits = int_part.as_bytes();
    for (i, d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*d as char);
    }
    let sign = if v < 0.0 && rounded != "0.0" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RawDataset, RawRow};
    use crate::features::SNAPSHOT_YEAR;

    fn dataset() -> RawDataset {
        let columns: Vec<String> = categories::all_columns_with_aggregates()
            .iter()
            .map(|c| c.to_string())
            .collect();
        let n_cols = columns.len();
        let rows: Vec<RawRow> = ["Australia", "Austria", "Belgium", "Canada"]
            .iter()
            .enumerate()
            .map(|(i, country)| RawRow {
                country: country.to_string(),
                year: SNAPSHOT_YEAR,
                values: (0..n_cols)
                    .map(|j| Some(1000.0 * i as f64 + j as f64))
                    .collect(),
            })
            .collect();

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
                csv.push_str(&v.unwrap().to_string());
            }
            csv.push('\n');
        }
        RawDataset::from_csv(csv.as_bytes()).unwrap()
    }

    #[test]
    fn build_transposes_columns_into_rows() {
        let view = TableView::build(&dataset()).unwrap();
        assert_eq!(view.countries.len(), 4);
        assert_eq!(
            view.rows.len(),
            categories::all_columns_with_aggregates().len()
        );
        // First registry entry's aggregate leads and is a summary row.
        assert_eq!(
            view.rows[0].name,
            "Infectious and parasitic diseases_Per 100 000 population"
        );
        assert_eq!(view.rows[0].kind, RowKind::Summary);
        assert_eq!(view.rows[1].kind, RowKind::Normal);
        assert!(!view.rows[0].display_name.contains('_'));
    }

    #[test]
    fn values_stay_aligned_with_countries() {
        let view = TableView::build(&dataset()).unwrap();
        let austria = view.country_index("Austria").unwrap();
        // Austria's source values are 1000 + column index.
        assert_eq!(view.rows[0].values[austria], 1000.0);
        assert_eq!(view.rows[1].values[austria], 1001.0);
    }

    #[test]
    fn single_column_chapters_classify_as_summary() {
        let view = TableView::build(&dataset()).unwrap();
        let ear = view
            .rows
            .iter()
            .find(|r| r.name.starts_with("Diseases of the ear"))
            .unwrap();
        assert_eq!(ear.kind, RowKind::Summary);
    }

    #[test]
    fn visible_rows_honour_selection_and_collapse() {
        let view = TableView::build(&dataset()).unwrap();
        let visible = view.visible_rows(&["Neoplasms"], &[]);
        // Aggregate + 13 diagnosis columns.
        assert_eq!(visible.len(), 14);

        let mut collapsed = vec![false; view.rows.len()];
        let summary = visible[0];
        assert_eq!(view.rows[summary].kind, RowKind::Summary);
        for i in view.chapter_rows(summary) {
            collapsed[i] = true;
        }
        let collapsed_visible = view.visible_rows(&["Neoplasms"], &collapsed);
        assert_eq!(collapsed_visible, vec![summary]);
    }

    #[test]
    fn chapter_rows_for_a_single_column_chapter_are_empty() {
        let view = TableView::build(&dataset()).unwrap();
        let ear = view
            .rows
            .iter()
            .position(|r| r.name.starts_with("Diseases of the ear"))
            .unwrap();
        assert!(view.chapter_rows(ear).is_empty());
    }

    #[test]
    fn format_value_groups_thousands() {
        assert_eq!(format_value(0.0), "0.0");
        assert_eq!(format_value(12.34), "12.3");
        assert_eq!(format_value(1234.0), "1,234.0");
        assert_eq!(format_value(1234567.89), "1,234,567.9");
        assert_eq!(format_value(-1234.56), "-1,234.6");
    }
}
