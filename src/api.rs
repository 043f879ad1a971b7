//! Synchronous client for the **INE `wstempus` JSON API**.
//!
//! Covers the three endpoints used by the CLI: available operations, tables of an
//! operation and table data. Requests are plain GETs, no retries: a failed request
//! fails the command.
//!
//! ### Notes
//! - The API answers an empty list as `null` for some operations; list helpers
//!   normalize that to an empty `Vec`.
//! - Table data is returned raw (`serde_json::Value`); see [`crate::flatten`].
//! - Requests are bounded by a 30s total timeout.
//!
//! Typical usage:
//! ```no_run
//! # use ine_rs::{Client, DataQuery};
//! # use ine_rs::flatten::{flatten, FlattenConfig};
//! let client = Client::default();
//! let raw = client.fetch_table_data(50902, &DataQuery { nult: Some(3), ..Default::default() })?;
//! let table = flatten(&raw, &FlattenConfig::full())?;
//! # Ok::<(), anyhow::Error>(())
//! ```
use crate::error::{ApiError, TransportError};
use crate::models::{DataQuery, Endpoint, Operation, TableInfo};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://servicios.ine.es/wstempus/js/ES";
pub const TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Client {
    pub base_url: String,
    http: HttpClient,
    timeout: Duration,
}

impl Default for Client {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

// Allow ':' unescaped in filter values (`tv=3:84`)
const SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b':');

fn enc(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s.trim(), SAFE).to_string()
}

/// Render `nult`, `tip` and repeated `tv` as a query string (with leading `?`),
/// or an empty string when nothing is set.
pub fn query_string(query: &DataQuery) -> String {
    if query.is_empty() {
        return String::new();
    }
    let mut params: Vec<String> = Vec::new();
    if let Some(n) = query.nult {
        params.push(format!("nult={}", n));
    }
    if let Some(tip) = query.tip {
        params.push(format!("tip={}", tip.as_str()));
    }
    for f in &query.filters {
        params.push(format!("tv={}", enc(&f.to_string())));
    }
    format!("?{}", params.join("&"))
}

impl Client {
    /// Client against another deployment of the API (or a local stub in tests).
    pub fn with_base_url(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(TIMEOUT_SECS))
    }

    pub(crate) fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let http = HttpClient::builder()
            .timeout(timeout) // total request timeout
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .redirect(Policy::limited(5))
            .user_agent(concat!("ine_rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("falling back to default HTTP client: {}", e);
                HttpClient::new()
            });
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        }
    }

    pub fn url(&self, endpoint: Endpoint, query: &DataQuery) -> String {
        format!("{}/{}{}", self.base_url, endpoint.path(), query_string(query))
    }

    /// GET an endpoint and parse the body as JSON.
    ///
    /// ### Errors
    /// - [`TransportError`] on network failure, timeout or a non-2xx status
    /// - [`ApiError::Parse`] when the body is not valid JSON
    pub fn fetch_json(&self, endpoint: Endpoint, query: &DataQuery) -> Result<Value, ApiError> {
        let url = self.url(endpoint, query);
        log::debug!("GET {}", url);

        let resp = self.http.get(&url).send().map_err(|e| self.transport(&url, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
            }
            .into());
        }
        let body = resp.bytes().map_err(|e| self.transport(&url, e))?;
        log::debug!("{} -> HTTP {} ({} bytes)", url, status.as_u16(), body.len());

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|source| ApiError::Parse { url, source })
    }

    /// List every available statistical operation.
    pub fn operations(&self) -> Result<Vec<Operation>, ApiError> {
        self.fetch_list(Endpoint::Operations)
    }

    /// List the tables published under an operation.
    pub fn tables(&self, operation_id: u64) -> Result<Vec<TableInfo>, ApiError> {
        self.fetch_list(Endpoint::OperationTables(operation_id))
    }

    /// Raw series records of a table, ready for [`crate::flatten::flatten`].
    pub fn fetch_table_data(&self, table_id: u64, query: &DataQuery) -> Result<Value, ApiError> {
        self.fetch_json(Endpoint::TableData(table_id), query)
    }

    fn fetch_list<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<Vec<T>, ApiError> {
        let query = DataQuery::default();
        let v = self.fetch_json(endpoint, &query)?;
        if v.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(v).map_err(|source| ApiError::Parse {
            url: self.url(endpoint, &query),
            source,
        })
    }

    fn transport(&self, url: &str, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
            .into()
        } else {
            TransportError::Network {
                url: url.to_string(),
                source: e,
            }
            .into()
        }
    }
}
