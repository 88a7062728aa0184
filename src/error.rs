use std::time::Duration;

use thiserror::Error;

/// Expected markup or embedded JSON is absent or malformed on a page.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no element matches `{selector}`")]
    MissingElement { selector: &'static str },
    #[error("job-cards provider data not found in script")]
    MissingProviderData,
    #[error("provider data is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("missing key `{path}`")]
    MissingKey { path: String },
    #[error("`{path}` is not {expected}")]
    WrongType { path: String, expected: &'static str },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("`{selector}` did not appear on {url} within {waited:?}")]
    Timeout {
        url: String,
        selector: String,
        waited: Duration,
    },
    #[error("failed to release page fetcher: {0}")]
    Release(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unexpected columns: expected {expected:?}, found {found:?}")]
    Schema {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("row {row}, column `{column}`: cannot read {value:?}")]
    Cell {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// Failure of one query's traversal.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to extract {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ScrapeError {
    pub fn parse(url: &str, source: ParseError) -> Self {
        ScrapeError::Parse {
            url: url.to_string(),
            source,
        }
    }
}
