use std::time::{Duration, Instant};

use scraper::{Html, Selector};
use tracing::warn;

use super::{PageFetcher, PageRequest};
use crate::error::FetchError;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const BASE_BACKOFF_MS: u64 = 1000;
const MAX_BACKOFF_EXP: u32 = 4;

/// Fetches server-rendered markup. Pages that are not ready yet are
/// re-requested with exponential backoff until the ready timeout runs out.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: &PageRequest<'_>) -> Result<String, FetchError> {
        let started = Instant::now();
        let mut attempt = 0u32;

        loop {
            let body = self
                .client
                .get(request.url)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;

            if is_ready(&body, request.ready) {
                return Ok(body);
            }

            let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt.min(MAX_BACKOFF_EXP)));
            if started.elapsed() + backoff > request.waits.ready {
                return Err(FetchError::Timeout {
                    url: request.url.to_string(),
                    selector: request.ready.to_string(),
                    waited: started.elapsed(),
                });
            }

            warn!(
                "{} not ready (attempt {}), retrying in {:.1}s",
                request.url,
                attempt + 1,
                backoff.as_secs_f64()
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }

    fn close(self) -> Result<(), FetchError> {
        Ok(())
    }
}

fn is_ready(body: &str, selector: &str) -> bool {
    match Selector::parse(selector) {
        Ok(selector) => Html::parse_document(body).select(&selector).next().is_some(),
        Err(_) => false,
    }
}
