//! Rendered-page fetching.
//!
//! A [`PageFetcher`] resolves only once the page it loaded contains the
//! requested readiness selector, or fails with [`FetchError::Timeout`].

pub mod chrome;
pub mod http;

use std::time::Duration;

use serde::Deserialize;

pub use chrome::ChromeFetcher;
pub use http::HttpFetcher;

use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Headless Chrome; renders client-side content and can close dialogs
    Chrome,
    /// Plain HTTP GET with retries until the page is ready
    Http,
}

/// How long to wait for content and for the interstitial dialog.
#[derive(Debug, Clone, Copy)]
pub struct Waits {
    pub ready: Duration,
    pub dismiss: Duration,
}

impl Default for Waits {
    fn default() -> Self {
        Self {
            ready: Duration::from_secs(20),
            dismiss: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub url: &'a str,
    /// CSS selector that must match before the page counts as rendered.
    pub ready: &'a str,
    /// Close button of a dialog to click away, if one shows up.
    pub dismiss: Option<&'a str>,
    pub waits: Waits,
}

#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    async fn fetch(&self, request: &PageRequest<'_>) -> Result<String, FetchError>;

    /// Release the underlying session.
    fn close(self) -> Result<(), FetchError>;
}
