//! Reshape a `DATOS_TABLA` response into a tidy [`FlatTable`].
//!
//! The API returns one record per series, each carrying its metadata and an
//! embedded `Data` array of observations:
//!
//! ```text
//! [{"Nombre": "...", "COD": "...", "Data": [{"Fecha": 0, "Valor": 1.5}, ...]}, ...]
//! ```
//!
//! Flattening emits one row per observation with the series metadata broadcast
//! onto it. Which fields are kept (and under which names) is decided by a
//! [`FlattenConfig`]; two presets cover the common cases:
//!
//! - [`FlattenConfig::full`]: every series field plus every observation field,
//!   `Fecha` converted from epoch milliseconds, `Valor` coerced to a number.
//! - [`FlattenConfig::compact`]: `serie, codigo, periodo, anyo, valor` only.
//!
//! Bad dates and non-numeric values become [`Cell::Null`]; they never abort the
//! transform.
//!
//! ```
//! use ine_rs::flatten::{flatten, FlattenConfig};
//!
//! let raw = serde_json::json!([
//!     {"Nombre": "S1", "COD": "C1", "Data": [{"Fecha": 0, "Valor": "10"}]}
//! ]);
//! let table = flatten(&raw, &FlattenConfig::full())?;
//! assert_eq!(table.len(), 1);
//! assert_eq!(table.rows[0]["Valor"].as_f64(), Some(10.0));
//! # Ok::<(), ine_rs::error::FlattenError>(())
//! ```

use crate::error::FlattenError;
use crate::models::{Cell, FlatTable, Row};
use chrono::DateTime;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Field holding the embedded observations of a series record.
pub const OBSERVATIONS_KEY: &str = "Data";
pub const DATE_FIELD: &str = "Fecha";
pub const VALUE_FIELD: &str = "Valor";

/// One field to copy from a record into the output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Name in the API record.
    pub source: String,
    /// Column name in the output.
    pub target: String,
    /// Trim surrounding whitespace from text values.
    pub trim: bool,
}

impl FieldSpec {
    pub fn new(name: &str) -> Self {
        Self::renamed(name, name)
    }

    pub fn renamed(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            trim: false,
        }
    }

    pub fn trimmed(mut self) -> Self {
        self.trim = true;
        self
    }
}

/// Which fields of a record end up in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelection {
    /// Every field of the record except the observations key.
    All,
    /// Only the listed fields, in the listed order. Missing ones are skipped.
    Only(Vec<FieldSpec>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenConfig {
    pub observations_key: String,
    /// Series metadata broadcast onto each row.
    pub series_fields: FieldSelection,
    pub observation_fields: FieldSelection,
    /// Output column holding epoch milliseconds to convert into a date.
    pub date_column: Option<String>,
    /// Output column to coerce to a number.
    pub value_column: Option<String>,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self::full()
    }
}

impl FlattenConfig {
    pub fn full() -> Self {
        Self {
            observations_key: OBSERVATIONS_KEY.into(),
            series_fields: FieldSelection::All,
            observation_fields: FieldSelection::All,
            date_column: Some(DATE_FIELD.into()),
            value_column: Some(VALUE_FIELD.into()),
        }
    }

    /// Series name (trimmed), code, period id, year and value.
    pub fn compact() -> Self {
        Self {
            observations_key: OBSERVATIONS_KEY.into(),
            series_fields: FieldSelection::Only(vec![
                FieldSpec::renamed("Nombre", "serie").trimmed(),
                FieldSpec::renamed("COD", "codigo"),
            ]),
            observation_fields: FieldSelection::Only(vec![
                FieldSpec::renamed("FK_Periodo", "periodo"),
                FieldSpec::renamed("Anyo", "anyo"),
                FieldSpec::renamed(VALUE_FIELD, "valor"),
            ]),
            date_column: None,
            value_column: Some("valor".into()),
        }
    }
}

/// Column names in first-appearance order.
#[derive(Default)]
struct ColumnOrder {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl ColumnOrder {
    fn push(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.names.push(name.to_string());
        }
    }
}

/// Flatten a table data response.
///
/// ### Errors
/// Only when the top level is neither an array nor null (e.g. an API error
/// object). Everything below that level degrades per row or per cell.
pub fn flatten(raw: &Value, config: &FlattenConfig) -> Result<FlatTable, FlattenError> {
    let series: &[Value] = match raw {
        Value::Array(items) => items,
        Value::Null => &[],
        other => {
            return Err(FlattenError::UnexpectedShape {
                found: kind_of(other),
            });
        }
    };

    let mut meta_columns = ColumnOrder::default();
    let mut obs_columns = ColumnOrder::default();
    let mut rows: Vec<Row> = Vec::new();

    for (i, entry) in series.iter().enumerate() {
        let Some(record) = entry.as_object() else {
            log::warn!("skipping series #{}: expected an object, got {}", i, kind_of(entry));
            continue;
        };
        let observations = match record.get(&config.observations_key) {
            Some(Value::Array(obs)) => obs.as_slice(),
            _ => &[],
        };
        if observations.is_empty() {
            continue;
        }

        let metadata = select(record, &config.series_fields, &config.observations_key, false);

        for (j, entry) in observations.iter().enumerate() {
            let Some(obs) = entry.as_object() else {
                log::warn!("skipping observation #{} of series #{}: not an object", j, i);
                continue;
            };
            let mut row = Row::new();
            for (name, cell) in &metadata {
                meta_columns.push(name);
                row.insert(name.clone(), cell.clone());
            }
            // Observation fields win on a name clash.
            for (name, cell) in select(obs, &config.observation_fields, &config.observations_key, true) {
                obs_columns.push(&name);
                row.insert(name, cell);
            }
            coerce_row(&mut row, config);
            rows.push(row);
        }
    }

    let mut columns = meta_columns.names;
    for name in obs_columns.names {
        if !meta_columns.seen.contains(&name) {
            columns.push(name);
        }
    }
    log::debug!(
        "flattened {} series into {} rows x {} columns",
        series.len(),
        rows.len(),
        columns.len()
    );
    Ok(FlatTable { columns, rows })
}

fn select(
    record: &Map<String, Value>,
    selection: &FieldSelection,
    observations_key: &str,
    expand_nested: bool,
) -> Vec<(String, Cell)> {
    let mut out = Vec::new();
    match selection {
        FieldSelection::All => {
            for (name, value) in record {
                if name == observations_key {
                    continue;
                }
                match value {
                    Value::Object(inner) if expand_nested => expand_into(name, inner, &mut out),
                    _ => out.push((name.clone(), Cell::from(value.clone()))),
                }
            }
        }
        FieldSelection::Only(specs) => {
            for spec in specs {
                let Some(value) = record.get(&spec.source) else {
                    continue;
                };
                let cell = match value {
                    Value::String(s) if spec.trim => Cell::Text(s.trim().to_string()),
                    other => Cell::from(other.clone()),
                };
                out.push((spec.target.clone(), cell));
            }
        }
    }
    out
}

/// `{"a": {"b": 1}}` becomes column `a.b`.
fn expand_into(prefix: &str, inner: &Map<String, Value>, out: &mut Vec<(String, Cell)>) {
    for (name, value) in inner {
        let key = format!("{}.{}", prefix, name);
        match value {
            Value::Object(deeper) => expand_into(&key, deeper, out),
            _ => out.push((key, Cell::from(value.clone()))),
        }
    }
}

fn coerce_row(row: &mut Row, config: &FlattenConfig) {
    if let Some(col) = &config.date_column
        && let Some(cell) = row.get_mut(col)
    {
        let coerced = coerce_date(cell);
        if coerced.is_null() && !cell.is_null() {
            log::debug!("{}: {:?} is not an epoch timestamp, using null", col, cell);
        }
        *cell = coerced;
    }
    if let Some(col) = &config.value_column
        && let Some(cell) = row.get_mut(col)
    {
        let coerced = coerce_value(cell);
        if coerced.is_null() && !cell.is_null() {
            log::debug!("{}: {:?} is not numeric, using null", col, cell);
        }
        *cell = coerced;
    }
}

/// Epoch milliseconds (number or numeric string) to a UTC date-time.
pub fn coerce_date(cell: &Cell) -> Cell {
    let millis = match cell {
        Cell::Date(d) => return Cell::Date(*d),
        Cell::Integer(i) => Some(*i),
        Cell::Number(x) if x.is_finite() => Some(*x as i64),
        Cell::Text(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|x| x.is_finite())
                    .map(|x| x as i64)
            })
        }
        _ => None,
    };
    millis
        .and_then(DateTime::from_timestamp_millis)
        .map(|d| Cell::Date(d.naive_utc()))
        .unwrap_or(Cell::Null)
}

/// Number or numeric string to `f64`; anything else is null.
pub fn coerce_value(cell: &Cell) -> Cell {
    let x = match cell {
        Cell::Number(x) => Some(*x),
        Cell::Integer(i) => Some(*i as f64),
        Cell::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    x.filter(|x| x.is_finite())
        .map(Cell::Number)
        .unwrap_or(Cell::Null)
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
