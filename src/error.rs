use thiserror::Error;

/// Errors surfaced by [`crate::api::Client`].
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("invalid response from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

/// The request never produced a usable (2xx) response.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("GET {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },
    #[error("GET {url} failed with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("GET {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlattenError {
    #[error("unexpected table data shape: expected an array of series, got {found}")]
    UnexpectedShape { found: &'static str },
}
