use crate::models::{Cell, FlatTable};
use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Text cells starting with these are read as formulas by spreadsheet software.
const FORMULA_STARTERS: [char; 5] = ['=', '+', '@', '\t', '\r'];

fn csv_field(cell: Option<&Cell>) -> String {
    match cell {
        None => String::new(),
        Some(Cell::Text(s)) if s.starts_with(FORMULA_STARTERS) => format!("'{}", s),
        Some(c) => c.to_string(),
    }
}

/// Save a flattened table as CSV with a header row.
///
/// Missing and null cells are written empty.
pub fn save_csv<P: AsRef<Path>>(table: &FlatTable, path: P, delimiter: u8) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    wtr.write_record(&table.columns)?;
    for row in &table.rows {
        wtr.write_record(table.columns.iter().map(|c| csv_field(row.get(c))))?;
    }
    wtr.flush()?;
    log::debug!("wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Save a flattened table as a pretty JSON array of objects (columns in table order).
pub fn save_json<P: AsRef<Path>>(table: &FlatTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let records = table
        .rows
        .iter()
        .map(|row| -> Result<Value> {
            let mut obj = Map::new();
            for c in &table.columns {
                if let Some(cell) = row.get(c) {
                    obj.insert(c.clone(), serde_json::to_value(cell)?);
                }
            }
            Ok(Value::Object(obj))
        })
        .collect::<Result<Vec<Value>>>()?;
    let mut f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let s = serde_json::to_string_pretty(&records)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Row;
    use tempfile::tempdir;

    #[test]
    fn write_csv_and_json() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("x.csv");
        let jsonp = dir.path().join("x.json");
        let mut row = Row::new();
        row.insert("Nombre".into(), Cell::Text("Total".into()));
        row.insert("Valor".into(), Cell::Number(1.25));
        let table = FlatTable {
            columns: vec!["Nombre".into(), "Valor".into()],
            rows: vec![row],
        };
        save_csv(&table, &csvp, b',').unwrap();
        save_json(&table, &jsonp).unwrap();
        assert_eq!(
            std::fs::read_to_string(&csvp).unwrap(),
            "Nombre,Valor\nTotal,1.25\n"
        );
        assert!(jsonp.exists());
    }
}
