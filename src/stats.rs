use crate::models::{Cell, FlatTable, Row};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Columns identifying a series, in order of preference.
pub const NAME_COLUMNS: [&str; 2] = ["Nombre", "serie"];
pub const DATE_COLUMNS: [&str; 1] = ["Fecha"];
pub const VALUE_COLUMNS: [&str; 2] = ["Valor", "valor"];

/// Number of trailing rows shown by the `datos` preview.
pub const PREVIEW_ROWS: usize = 5;

/// Overview of a flattened table, as printed by `ine datos`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSummary {
    pub rows: usize,
    pub columns: Vec<String>,
    /// Distinct non-null series names, when a name column exists.
    pub unique_series: Option<usize>,
    /// Earliest and latest non-null date, when a date column exists.
    pub date_range: Option<(NaiveDateTime, NaiveDateTime)>,
    /// Columns shown in the preview (subset of name/date/value).
    pub preview_columns: Vec<String>,
    /// Last rows of the table restricted to `preview_columns`.
    pub preview: Vec<Row>,
}

pub fn summarize(table: &FlatTable) -> TableSummary {
    let name_col = table.first_column(&NAME_COLUMNS);
    let date_col = table.first_column(&DATE_COLUMNS);
    let value_col = table.first_column(&VALUE_COLUMNS);

    let unique_series = name_col.map(|col| {
        table
            .column(col)
            .flatten()
            .filter(|c| !c.is_null())
            .map(|c| c.to_string())
            .collect::<HashSet<_>>()
            .len()
    });

    let date_range = date_col.and_then(|col| {
        let mut dates = table.column(col).flatten().filter_map(Cell::as_date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    });

    let preview_columns: Vec<String> = [name_col, date_col, value_col]
        .into_iter()
        .flatten()
        .map(String::from)
        .collect();
    let skip = table.len().saturating_sub(PREVIEW_ROWS);
    let preview: Vec<Row> = table.rows[skip..]
        .iter()
        .map(|row| {
            preview_columns
                .iter()
                .filter_map(|c| row.get(c).map(|cell| (c.clone(), cell.clone())))
                .collect()
        })
        .collect();

    TableSummary {
        rows: table.len(),
        columns: table.columns.clone(),
        unique_series,
        date_range,
        preview_columns,
        preview,
    }
}

/// Summary statistics for one series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub key: String,
    pub count: usize,
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Compute statistics of `value_col` grouped by `group_col`, sorted by group.
///
/// Rows without the group column are ignored; null or absent values count as missing.
pub fn grouped_summary(table: &FlatTable, group_col: &str, value_col: &str) -> Vec<Summary> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut missing: BTreeMap<String, usize> = BTreeMap::new();
    for row in &table.rows {
        let Some(key) = row.get(group_col).filter(|c| !c.is_null()) else {
            continue;
        };
        let key = key.to_string();
        match row.get(value_col).and_then(Cell::as_f64) {
            Some(v) => groups.entry(key).or_default().push(v),
            None => {
                groups.entry(key.clone()).or_default();
                *missing.entry(key).or_default() += 1;
            }
        }
    }

    let mut out = Vec::new();
    for (key, mut vals) in groups {
        vals.sort_by(f64::total_cmp);
        let count = vals.len();
        let min = vals.first().cloned();
        let max = vals.last().cloned();
        let mean = if count > 0 {
            Some(vals.iter().copied().sum::<f64>() / count as f64)
        } else {
            None
        };
        let median = if count == 0 {
            None
        } else if count % 2 == 1 {
            Some(vals[count / 2])
        } else {
            Some((vals[count / 2 - 1] + vals[count / 2]) / 2.0)
        };
        let miss = missing.get(&key).cloned().unwrap_or(0);
        out.push(Summary {
            key,
            count,
            missing: miss,
            min,
            max,
            mean,
            median,
        });
    }
    out
}
