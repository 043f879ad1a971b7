//! Console rendering for the `ine` CLI.
//!
//! Every function returns a `String` so output can be checked without a terminal.

use crate::models::{DATE_FORMAT, Operation, TableInfo};
use crate::stats::{Summary, TableSummary};
use num_format::{Locale, ToFormattedString};
use std::fmt::Write;

/// Shorten `s` to `keep` chars plus `...` when it is longer than `max` chars.
pub fn truncate(s: &str, max: usize, keep: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(keep).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

/// Thousands-separated count (`12.345`).
pub fn fmt_count(n: usize) -> String {
    n.to_formatted_string(&Locale::es)
}

pub fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            // Up to 4 decimals, then trim trailing zeros and trailing dot.
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

pub fn render_operations(ops: &[Operation]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{:>6}  {:<12}  Nombre", "Id", "Código");
    let _ = writeln!(out, "{}", "-".repeat(80));
    for op in ops {
        let _ = writeln!(
            out,
            "{:>6}  {:<12}  {}",
            op.id,
            op.code,
            truncate(&op.name, 58, 55)
        );
    }
    let _ = writeln!(out, "\nTotal: {} operaciones", fmt_count(ops.len()));
    out
}

pub fn render_tables(tables: &[TableInfo]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{:>8}  {:<15}  Nombre", "Id", "Periodo");
    let _ = writeln!(out, "{}", "-".repeat(90));
    for t in tables {
        let _ = writeln!(
            out,
            "{:>8}  {:<15}  {}",
            t.id,
            t.period(),
            truncate(&t.name, 63, 60)
        );
    }
    let _ = writeln!(out, "\nTotal: {} tablas", fmt_count(tables.len()));
    out
}

pub fn render_summary(s: &TableSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nRegistros: {}", fmt_count(s.rows));
    let _ = writeln!(out, "Columnas: {}", s.columns.join(", "));
    if let Some(n) = s.unique_series {
        let _ = writeln!(out, "Series únicas: {}", fmt_count(n));
    }
    if let Some((lo, hi)) = s.date_range {
        let _ = writeln!(
            out,
            "Rango temporal: {} → {}",
            lo.format(DATE_FORMAT),
            hi.format(DATE_FORMAT)
        );
    }
    if s.preview_columns.is_empty() {
        return out;
    }

    let _ = writeln!(
        out,
        "\nVista previa (últimos {} registros):",
        s.preview.len()
    );
    let cells: Vec<Vec<String>> = s
        .preview
        .iter()
        .map(|row| {
            s.preview_columns
                .iter()
                .map(|c| row.get(c).map(|v| v.to_string()).unwrap_or_default())
                .collect()
        })
        .collect();
    let widths: Vec<usize> = s
        .preview_columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let line = |fields: Vec<&str>| {
        fields
            .iter()
            .zip(&widths)
            .map(|(f, w)| format!("{:>w$}", f, w = *w))
            .collect::<Vec<_>>()
            .join(" ")
    };
    let _ = writeln!(
        out,
        "{}",
        line(s.preview_columns.iter().map(String::as_str).collect())
    );
    for r in &cells {
        let _ = writeln!(out, "{}", line(r.iter().map(String::as_str).collect()));
    }
    out
}

pub fn render_stats(stats: &[Summary]) -> String {
    let mut out = String::new();
    for s in stats {
        let _ = writeln!(
            out,
            "{}  count={} missing={}  min={} max={} mean={} median={}",
            s.key,
            s.count,
            s.missing,
            fmt_opt(s.min),
            fmt_opt(s.max),
            fmt_opt(s.mean),
            fmt_opt(s.median)
        );
    }
    out
}
