//! ine_rs
//!
//! A lightweight Rust library for listing, retrieving, flattening, and exporting
//! tables from the INE (Instituto Nacional de Estadística) JSON API. Pairs with
//! the `ine` CLI.
//!
//! ### Features
//! - List statistical operations and the tables published under each one
//! - Fetch table data with `nult` / `tip` / `tv` filters
//! - Flatten nested series/observation responses into a tidy, typed table
//! - Save as CSV or JSON; quick per-series statistics
//!
//! ### Example
//! ```no_run
//! use ine_rs::{Client, DataQuery};
//! use ine_rs::flatten::{flatten, FlattenConfig};
//!
//! let client = Client::default();
//! let raw = client.fetch_table_data(50902, &DataQuery { nult: Some(3), ..Default::default() })?;
//! let table = flatten(&raw, &FlattenConfig::full())?;
//! ine_rs::storage::save_csv(&table, "ipc.csv", b',')?;
//! let stats = ine_rs::stats::grouped_summary(&table, "Nombre", "Valor");
//! println!("{:#?}", stats);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod error;
pub mod flatten;
pub mod models;
pub mod report;
pub mod stats;
pub mod storage;

pub use api::Client;
pub use error::{ApiError, FlattenError, TransportError};
pub use flatten::{FlattenConfig, flatten};
pub use models::{Cell, DataQuery, FlatTable, Operation, TableInfo};
