use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Endpoints of the INE `wstempus` JSON service used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `OPERACIONES_DISPONIBLES`
    Operations,
    /// `TABLAS_OPERACION/{id}`
    OperationTables(u64),
    /// `DATOS_TABLA/{id}`
    TableData(u64),
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Operations => "OPERACIONES_DISPONIBLES",
            Endpoint::OperationTables(_) => "TABLAS_OPERACION",
            Endpoint::TableData(_) => "DATOS_TABLA",
        }
    }

    pub fn path(&self) -> String {
        match *self {
            Endpoint::Operations => self.name().to_string(),
            Endpoint::OperationTables(id) | Endpoint::TableData(id) => {
                format!("{}/{}", self.name(), id)
            }
        }
    }
}

/// Shape of a data response (`tip` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tip {
    /// Friendly output: readable labels instead of ids.
    A,
    /// Include series metadata.
    M,
    /// Both of the above.
    AM,
}

impl Tip {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tip::A => "A",
            Tip::M => "M",
            Tip::AM => "AM",
        }
    }
}

impl FromStr for Tip {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Tip::A),
            "M" => Ok(Tip::M),
            "AM" | "MA" => Ok(Tip::AM),
            other => Err(format!("invalid tip '{}', expected A, M or AM", other)),
        }
    }
}

/// A classification-variable filter (`tv=variable:value`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationFilter {
    pub variable: String,
    pub value: String,
}

impl FromStr for ClassificationFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (variable, value) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid filter '{}', expected VARIABLE:VALUE", s))?;
        let (variable, value) = (variable.trim(), value.trim());
        if variable.is_empty() || value.is_empty() {
            return Err(format!("invalid filter '{}', expected VARIABLE:VALUE", s));
        }
        Ok(Self {
            variable: variable.to_string(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for ClassificationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.variable, self.value)
    }
}

/// Optional query parameters for the table data endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuery {
    /// Return only the last N periods (`nult`).
    pub nult: Option<u32>,
    pub tip: Option<Tip>,
    /// Classification filters, sent as repeated `tv` parameters.
    pub filters: Vec<ClassificationFilter>,
}

impl DataQuery {
    pub fn is_empty(&self) -> bool {
        self.nult.is_none() && self.tip.is_none() && self.filters.is_empty()
    }
}

/// Operation record as returned by `OPERACIONES_DISPONIBLES`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operation {
    #[serde(rename = "Id")]
    pub id: u64,
    #[serde(rename = "Codigo", default)]
    pub code: String,
    #[serde(rename = "Nombre", default)]
    pub name: String,
}

/// Table record as returned by `TABLAS_OPERACION/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableInfo {
    #[serde(rename = "Id")]
    pub id: u64,
    #[serde(rename = "Nombre", default)]
    pub name: String,
    /// The API encodes period years either as strings or as numbers.
    #[serde(
        rename = "Anyo_Periodo_Ini",
        default,
        deserialize_with = "de_opt_string_from_any"
    )]
    pub period_start_year: Option<String>,
    #[serde(
        rename = "Anyo_Periodo_Fin",
        default,
        deserialize_with = "de_opt_string_from_any"
    )]
    pub period_end_year: Option<String>,
}

impl TableInfo {
    /// `ini-fin`, with empty sides when a bound is unknown.
    pub fn period(&self) -> String {
        format!(
            "{}-{}",
            self.period_start_year.as_deref().unwrap_or(""),
            self.period_end_year.as_deref().unwrap_or("")
        )
    }
}

/// Serde helper: accept a string, a number or null as `Option<String>`.
fn de_opt_string_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct OptStringVisitor;

    impl<'de> Visitor<'de> for OptStringVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a string, a number or null")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
    }

    deserializer.deserialize_any(OptStringVisitor)
}

/// One cell of a flattened table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
    /// Arrays and objects, kept as-is.
    Json(Value),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Cell::Number(x) => Some(x),
            Cell::Integer(i) => Some(i as f64),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match *self {
            Cell::Date(d) => Some(d),
            _ => None,
        }
    }
}

impl From<Value> for Cell {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Integer(i),
                None => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
            },
            Value::String(s) => Cell::Text(s),
            other => Cell::Json(other),
        }
    }
}

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_number(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{:.1}", x)
    } else {
        x.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Integer(i) => write!(f, "{}", i),
            Cell::Number(x) => f.write_str(&fmt_number(*x)),
            Cell::Text(s) => f.write_str(s),
            Cell::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Cell::Json(v) => write!(f, "{}", v),
        }
    }
}

/// One flattened observation: column name to cell. Absent key = field not present.
pub type Row = BTreeMap<String, Cell>;

/// Tidy table produced by [`crate::flatten`] (one row = one observation).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatTable {
    /// Column names in output order.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl FlatTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Cells of one column, `None` where a row lacks the field.
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = Option<&'a Cell>> + 'a {
        self.rows.iter().map(move |r| r.get(name))
    }

    /// First of `candidates` that exists as a column.
    pub fn first_column<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|c| self.has_column(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_paths() {
        assert_eq!(Endpoint::Operations.path(), "OPERACIONES_DISPONIBLES");
        assert_eq!(Endpoint::OperationTables(25).path(), "TABLAS_OPERACION/25");
        assert_eq!(Endpoint::TableData(76092).path(), "DATOS_TABLA/76092");
    }

    #[test]
    fn filter_parses_and_rejects() {
        let f: ClassificationFilter = "3:84".parse().unwrap();
        assert_eq!(f.variable, "3");
        assert_eq!(f.value, "84");
        assert_eq!(f.to_string(), "3:84");
        assert!("384".parse::<ClassificationFilter>().is_err());
        assert!(":84".parse::<ClassificationFilter>().is_err());
    }

    #[test]
    fn data_query_emptiness() {
        assert!(DataQuery::default().is_empty());
        let q = DataQuery {
            nult: Some(1),
            ..Default::default()
        };
        assert!(!q.is_empty());
    }

    #[test]
    fn tip_parses_case_insensitively() {
        assert_eq!("am".parse::<Tip>().unwrap(), Tip::AM);
        assert_eq!("M".parse::<Tip>().unwrap(), Tip::M);
        assert!("X".parse::<Tip>().is_err());
    }

    #[test]
    fn cell_display() {
        assert_eq!(Cell::Number(10.0).to_string(), "10.0");
        assert_eq!(Cell::Number(12.5).to_string(), "12.5");
        assert_eq!(Cell::Integer(2024).to_string(), "2024");
        assert_eq!(Cell::Null.to_string(), "");
        let d = chrono::DateTime::from_timestamp_millis(0).unwrap().naive_utc();
        assert_eq!(Cell::Date(d).to_string(), "1970-01-01 00:00:00");
    }
}
